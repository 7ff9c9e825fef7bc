//! The mapping between GenQuery2 column names and the physical catalog
//! schema, plus the classification of columns that require specialized join
//! handling.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{Error, ErrorKind};

/// The physical table and column a virtual column resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnInfo {
    pub table: &'static str,
    pub name: &'static str,
}

// Virtual column name, physical table, physical column.
//
// Metadata and access columns name the table their values ultimately live in
// (R_META_MAIN, R_OBJT_ACCESS, R_TOKN_MAIN, R_USER_MAIN); the generator never
// adds those tables to the join list directly, it reaches them through the
// reserved-alias join patterns.
const COLUMN_MAPPINGS: &[(&str, &str, &str)] = &[
    // R_ZONE_MAIN
    ("ZONE_ID", "R_ZONE_MAIN", "zone_id"),
    ("ZONE_NAME", "R_ZONE_MAIN", "zone_name"),
    ("ZONE_TYPE", "R_ZONE_MAIN", "zone_type_name"),
    ("ZONE_CONNECTION", "R_ZONE_MAIN", "zone_conn_string"),
    ("ZONE_COMMENT", "R_ZONE_MAIN", "r_comment"),
    // R_USER_MAIN
    ("USER_ID", "R_USER_MAIN", "user_id"),
    ("USER_NAME", "R_USER_MAIN", "user_name"),
    ("USER_TYPE", "R_USER_MAIN", "user_type_name"),
    ("USER_ZONE", "R_USER_MAIN", "zone_name"),
    ("USER_INFO", "R_USER_MAIN", "user_info"),
    ("USER_COMMENT", "R_USER_MAIN", "r_comment"),
    ("USER_CREATE_TIME", "R_USER_MAIN", "create_ts"),
    ("USER_MODIFY_TIME", "R_USER_MAIN", "modify_ts"),
    ("USER_DN", "R_USER_AUTH", "user_auth_name"),
    ("USER_GROUP_ID", "R_USER_GROUP", "group_user_id"),
    // R_RESC_MAIN
    ("RESC_ID", "R_RESC_MAIN", "resc_id"),
    ("RESC_NAME", "R_RESC_MAIN", "resc_name"),
    ("RESC_ZONE_NAME", "R_RESC_MAIN", "zone_name"),
    ("RESC_TYPE_NAME", "R_RESC_MAIN", "resc_type_name"),
    ("RESC_CLASS_NAME", "R_RESC_MAIN", "resc_class_name"),
    ("RESC_LOC", "R_RESC_MAIN", "resc_net"),
    ("RESC_VAULT_PATH", "R_RESC_MAIN", "resc_def_path"),
    ("RESC_FREE_SPACE", "R_RESC_MAIN", "free_space"),
    ("RESC_FREE_SPACE_TIME", "R_RESC_MAIN", "free_space_ts"),
    ("RESC_INFO", "R_RESC_MAIN", "resc_info"),
    ("RESC_COMMENT", "R_RESC_MAIN", "r_comment"),
    ("RESC_STATUS", "R_RESC_MAIN", "resc_status"),
    ("RESC_CREATE_TIME", "R_RESC_MAIN", "create_ts"),
    ("RESC_MODIFY_TIME", "R_RESC_MAIN", "modify_ts"),
    ("RESC_CHILDREN", "R_RESC_MAIN", "resc_children"),
    ("RESC_CONTEXT", "R_RESC_MAIN", "resc_context"),
    ("RESC_PARENT", "R_RESC_MAIN", "resc_parent"),
    ("RESC_PARENT_CONTEXT", "R_RESC_MAIN", "resc_parent_context"),
    // R_COLL_MAIN
    ("COLL_ID", "R_COLL_MAIN", "coll_id"),
    ("COLL_NAME", "R_COLL_MAIN", "coll_name"),
    ("COLL_PARENT_NAME", "R_COLL_MAIN", "parent_coll_name"),
    ("COLL_OWNER_NAME", "R_COLL_MAIN", "coll_owner_name"),
    ("COLL_OWNER_ZONE", "R_COLL_MAIN", "coll_owner_zone"),
    ("COLL_MAP_ID", "R_COLL_MAIN", "coll_map_id"),
    ("COLL_INHERITANCE", "R_COLL_MAIN", "coll_inheritance"),
    ("COLL_COMMENTS", "R_COLL_MAIN", "r_comment"),
    ("COLL_INFO1", "R_COLL_MAIN", "coll_info1"),
    ("COLL_INFO2", "R_COLL_MAIN", "coll_info2"),
    ("COLL_CREATE_TIME", "R_COLL_MAIN", "create_ts"),
    ("COLL_MODIFY_TIME", "R_COLL_MAIN", "modify_ts"),
    // R_DATA_MAIN
    ("DATA_ID", "R_DATA_MAIN", "data_id"),
    ("DATA_COLL_ID", "R_DATA_MAIN", "coll_id"),
    ("DATA_NAME", "R_DATA_MAIN", "data_name"),
    ("DATA_REPL_NUM", "R_DATA_MAIN", "data_repl_num"),
    ("DATA_VERSION", "R_DATA_MAIN", "data_version"),
    ("DATA_TYPE_NAME", "R_DATA_MAIN", "data_type_name"),
    ("DATA_SIZE", "R_DATA_MAIN", "data_size"),
    ("DATA_PATH", "R_DATA_MAIN", "data_path"),
    ("DATA_OWNER_NAME", "R_DATA_MAIN", "data_owner_name"),
    ("DATA_OWNER_ZONE", "R_DATA_MAIN", "data_owner_zone"),
    ("DATA_REPL_STATUS", "R_DATA_MAIN", "data_is_dirty"),
    ("DATA_STATUS", "R_DATA_MAIN", "data_status"),
    ("DATA_CHECKSUM", "R_DATA_MAIN", "data_checksum"),
    ("DATA_EXPIRY", "R_DATA_MAIN", "data_expiry_ts"),
    ("DATA_MAP_ID", "R_DATA_MAIN", "data_map_id"),
    ("DATA_MODE", "R_DATA_MAIN", "data_mode"),
    ("DATA_COMMENTS", "R_DATA_MAIN", "r_comment"),
    ("DATA_CREATE_TIME", "R_DATA_MAIN", "create_ts"),
    ("DATA_MODIFY_TIME", "R_DATA_MAIN", "modify_ts"),
    ("DATA_RESC_ID", "R_DATA_MAIN", "resc_id"),
    // DATA_RESC_HIER projects the hierarchy column of the recursive CTE; the
    // catalog entry anchors it to R_RESC_MAIN.
    ("DATA_RESC_HIER", "R_RESC_MAIN", "hier"),
    // R_META_MAIN, reached through ommd/mmd and friends
    ("META_DATA_ATTR_ID", "R_META_MAIN", "meta_id"),
    ("META_DATA_ATTR_NAME", "R_META_MAIN", "meta_attr_name"),
    ("META_DATA_ATTR_VALUE", "R_META_MAIN", "meta_attr_value"),
    ("META_DATA_ATTR_UNITS", "R_META_MAIN", "meta_attr_unit"),
    ("META_DATA_CREATE_TIME", "R_META_MAIN", "create_ts"),
    ("META_DATA_MODIFY_TIME", "R_META_MAIN", "modify_ts"),
    ("META_COLL_ATTR_ID", "R_META_MAIN", "meta_id"),
    ("META_COLL_ATTR_NAME", "R_META_MAIN", "meta_attr_name"),
    ("META_COLL_ATTR_VALUE", "R_META_MAIN", "meta_attr_value"),
    ("META_COLL_ATTR_UNITS", "R_META_MAIN", "meta_attr_unit"),
    ("META_COLL_CREATE_TIME", "R_META_MAIN", "create_ts"),
    ("META_COLL_MODIFY_TIME", "R_META_MAIN", "modify_ts"),
    ("META_RESC_ATTR_ID", "R_META_MAIN", "meta_id"),
    ("META_RESC_ATTR_NAME", "R_META_MAIN", "meta_attr_name"),
    ("META_RESC_ATTR_VALUE", "R_META_MAIN", "meta_attr_value"),
    ("META_RESC_ATTR_UNITS", "R_META_MAIN", "meta_attr_unit"),
    ("META_RESC_CREATE_TIME", "R_META_MAIN", "create_ts"),
    ("META_RESC_MODIFY_TIME", "R_META_MAIN", "modify_ts"),
    ("META_USER_ATTR_ID", "R_META_MAIN", "meta_id"),
    ("META_USER_ATTR_NAME", "R_META_MAIN", "meta_attr_name"),
    ("META_USER_ATTR_VALUE", "R_META_MAIN", "meta_attr_value"),
    ("META_USER_ATTR_UNITS", "R_META_MAIN", "meta_attr_unit"),
    ("META_USER_CREATE_TIME", "R_META_MAIN", "create_ts"),
    ("META_USER_MODIFY_TIME", "R_META_MAIN", "modify_ts"),
    // Access columns, reached through pdoa/pdt/pdu and pcoa/pct/pcu
    ("DATA_ACCESS_TYPE", "R_OBJT_ACCESS", "access_type_id"),
    ("DATA_ACCESS_DATA_ID", "R_OBJT_ACCESS", "object_id"),
    ("DATA_ACCESS_USER_ID", "R_OBJT_ACCESS", "user_id"),
    ("DATA_ACCESS_PERM_NAME", "R_TOKN_MAIN", "token_name"),
    ("DATA_ACCESS_USER_NAME", "R_USER_MAIN", "user_name"),
    ("COLL_ACCESS_TYPE", "R_OBJT_ACCESS", "access_type_id"),
    ("COLL_ACCESS_COLL_ID", "R_OBJT_ACCESS", "object_id"),
    ("COLL_ACCESS_USER_ID", "R_OBJT_ACCESS", "user_id"),
    ("COLL_ACCESS_PERM_NAME", "R_TOKN_MAIN", "token_name"),
    ("COLL_ACCESS_USER_NAME", "R_USER_MAIN", "user_name"),
    // R_TOKN_MAIN
    ("TOKEN_NAMESPACE", "R_TOKN_MAIN", "token_namespace"),
    ("TOKEN_ID", "R_TOKN_MAIN", "token_id"),
    ("TOKEN_NAME", "R_TOKN_MAIN", "token_name"),
    ("TOKEN_VALUE", "R_TOKN_MAIN", "token_value"),
    ("TOKEN_VALUE2", "R_TOKN_MAIN", "token_value2"),
    ("TOKEN_VALUE3", "R_TOKN_MAIN", "token_value3"),
    ("TOKEN_COMMENT", "R_TOKN_MAIN", "r_comment"),
    // R_TICKET_MAIN and the allowed-* tables
    ("TICKET_ID", "R_TICKET_MAIN", "ticket_id"),
    ("TICKET_STRING", "R_TICKET_MAIN", "ticket_string"),
    ("TICKET_TYPE", "R_TICKET_MAIN", "ticket_type"),
    ("TICKET_USER_ID", "R_TICKET_MAIN", "user_id"),
    ("TICKET_OBJECT_ID", "R_TICKET_MAIN", "object_id"),
    ("TICKET_OBJECT_TYPE", "R_TICKET_MAIN", "object_type"),
    ("TICKET_USES_LIMIT", "R_TICKET_MAIN", "uses_limit"),
    ("TICKET_USES_COUNT", "R_TICKET_MAIN", "uses_count"),
    ("TICKET_WRITE_FILE_LIMIT", "R_TICKET_MAIN", "write_file_limit"),
    ("TICKET_WRITE_FILE_COUNT", "R_TICKET_MAIN", "write_file_count"),
    ("TICKET_WRITE_BYTE_LIMIT", "R_TICKET_MAIN", "write_byte_limit"),
    ("TICKET_WRITE_BYTE_COUNT", "R_TICKET_MAIN", "write_byte_count"),
    ("TICKET_EXPIRY_TIME", "R_TICKET_MAIN", "ticket_expiry_ts"),
    ("TICKET_CREATE_TIME", "R_TICKET_MAIN", "create_time"),
    ("TICKET_MODIFY_TIME", "R_TICKET_MAIN", "modify_time"),
    ("TICKET_ALLOWED_HOST", "R_TICKET_ALLOWED_HOSTS", "host"),
    ("TICKET_ALLOWED_HOST_TICKET_ID", "R_TICKET_ALLOWED_HOSTS", "ticket_id"),
    ("TICKET_ALLOWED_USER_NAME", "R_TICKET_ALLOWED_USERS", "user_name"),
    ("TICKET_ALLOWED_GROUP_NAME", "R_TICKET_ALLOWED_GROUPS", "group_name"),
    // R_QUOTA_MAIN
    ("QUOTA_USER_ID", "R_QUOTA_MAIN", "user_id"),
    ("QUOTA_RESC_ID", "R_QUOTA_MAIN", "resc_id"),
    ("QUOTA_LIMIT", "R_QUOTA_MAIN", "quota_limit"),
    ("QUOTA_OVER", "R_QUOTA_MAIN", "quota_over"),
    ("QUOTA_MODIFY_TIME", "R_QUOTA_MAIN", "modify_ts"),
    // R_RULE_EXEC
    ("RULE_EXEC_ID", "R_RULE_EXEC", "rule_exec_id"),
    ("RULE_EXEC_NAME", "R_RULE_EXEC", "rule_name"),
    ("RULE_EXEC_REI_FILE_PATH", "R_RULE_EXEC", "rei_file_path"),
    ("RULE_EXEC_USER_NAME", "R_RULE_EXEC", "user_name"),
    ("RULE_EXEC_ADDRESS", "R_RULE_EXEC", "exe_address"),
    ("RULE_EXEC_TIME", "R_RULE_EXEC", "exe_time"),
    ("RULE_EXEC_FREQUENCY", "R_RULE_EXEC", "exe_frequency"),
    ("RULE_EXEC_PRIORITY", "R_RULE_EXEC", "priority"),
    ("RULE_EXEC_ESTIMATED_EXE_TIME", "R_RULE_EXEC", "estimated_exe_time"),
    ("RULE_EXEC_NOTIFICATION_ADDR", "R_RULE_EXEC", "notification_addr"),
    ("RULE_EXEC_LAST_EXE_TIME", "R_RULE_EXEC", "last_exe_time"),
    ("RULE_EXEC_STATUS", "R_RULE_EXEC", "exe_status"),
];

static COLUMNS: Lazy<HashMap<&'static str, ColumnInfo>> = Lazy::new(|| {
    COLUMN_MAPPINGS
        .iter()
        .map(|(column, table, name)| (*column, ColumnInfo { table, name }))
        .collect()
});

pub(crate) fn lookup(name: &str) -> Result<&'static ColumnInfo, Error> {
    COLUMNS.get(name).ok_or_else(|| {
        Error::new(ErrorKind::UnknownColumn {
            name: name.to_string(),
        })
        .with_help("column names are case-sensitive, e.g. COLL_NAME, DATA_ID")
    })
}

/// How a column participates in join planning. Special columns are satisfied
/// by hard-coded join patterns and reserved aliases; the graph only ever sees
/// their anchoring table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Classification {
    MetaData,
    MetaColl,
    MetaResc,
    MetaUser,
    DataAccessObjt,
    DataAccessPerm,
    DataAccessUser,
    CollAccessObjt,
    CollAccessPerm,
    CollAccessUser,
    DataRescHier,
    Plain,
}

pub(crate) fn classify(name: &str) -> Classification {
    use Classification::*;

    if name.starts_with("META_D") {
        MetaData
    } else if name.starts_with("META_C") {
        MetaColl
    } else if name.starts_with("META_R") {
        MetaResc
    } else if name.starts_with("META_U") {
        MetaUser
    } else if name.starts_with("DATA_ACCESS_") {
        match name {
            "DATA_ACCESS_PERM_NAME" => DataAccessPerm,
            "DATA_ACCESS_USER_NAME" => DataAccessUser,
            _ => DataAccessObjt,
        }
    } else if name.starts_with("COLL_ACCESS_") {
        match name {
            "COLL_ACCESS_PERM_NAME" => CollAccessPerm,
            "COLL_ACCESS_USER_NAME" => CollAccessUser,
            _ => CollAccessObjt,
        }
    } else if name == "DATA_RESC_HIER" {
        DataRescHier
    } else {
        Plain
    }
}

impl Classification {
    /// The pre-defined alias special columns render through. `None` for plain
    /// columns, which use the generated alias of their own table.
    pub fn reserved_alias(&self) -> Option<&'static str> {
        use Classification::*;

        match self {
            MetaData => Some("mmd"),
            MetaColl => Some("mmc"),
            MetaResc => Some("mmr"),
            MetaUser => Some("mmu"),
            DataAccessObjt => Some("pdoa"),
            DataAccessPerm => Some("pdt"),
            DataAccessUser => Some("pdu"),
            CollAccessObjt => Some("pcoa"),
            CollAccessPerm => Some("pct"),
            CollAccessUser => Some("pcu"),
            DataRescHier => Some("cte_drh"),
            Plain => None,
        }
    }

    /// The table the specialized join pattern attaches to. The generator adds
    /// this table to the join list instead of the column's own.
    pub fn anchor_table(&self) -> Option<&'static str> {
        use Classification::*;

        match self {
            MetaData | DataAccessObjt | DataAccessPerm | DataAccessUser => Some("R_DATA_MAIN"),
            MetaColl | CollAccessObjt | CollAccessPerm | CollAccessUser => Some("R_COLL_MAIN"),
            MetaResc | DataRescHier => Some("R_RESC_MAIN"),
            MetaUser => Some("R_USER_MAIN"),
            Plain => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lookup() {
        let info = lookup("COLL_NAME").unwrap();
        assert_eq!(info.table, "R_COLL_MAIN");
        assert_eq!(info.name, "coll_name");

        let err = lookup("coll_name").unwrap_err();
        assert_eq!(
            err.kind,
            crate::ErrorKind::UnknownColumn {
                name: "coll_name".to_string()
            }
        );
    }

    #[test]
    fn test_classification() {
        assert_eq!(classify("META_DATA_ATTR_NAME"), Classification::MetaData);
        assert_eq!(classify("META_COLL_ATTR_VALUE"), Classification::MetaColl);
        assert_eq!(classify("META_RESC_ATTR_UNITS"), Classification::MetaResc);
        assert_eq!(classify("META_USER_ATTR_ID"), Classification::MetaUser);
        assert_eq!(classify("DATA_ACCESS_PERM_NAME"), Classification::DataAccessPerm);
        assert_eq!(classify("DATA_ACCESS_USER_NAME"), Classification::DataAccessUser);
        assert_eq!(classify("DATA_ACCESS_TYPE"), Classification::DataAccessObjt);
        assert_eq!(classify("COLL_ACCESS_PERM_NAME"), Classification::CollAccessPerm);
        assert_eq!(classify("DATA_RESC_HIER"), Classification::DataRescHier);
        assert_eq!(classify("DATA_RESC_ID"), Classification::Plain);
        assert_eq!(classify("COLL_NAME"), Classification::Plain);
    }

    #[test]
    fn test_every_mapped_table_is_a_graph_vertex() {
        for (column, table, _) in COLUMN_MAPPINGS {
            assert!(
                crate::schema::is_table(table),
                "{column} maps to unknown table {table}"
            );
        }
    }
}
