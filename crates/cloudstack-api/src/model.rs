//! Response models for the list commands

use serde::{Deserialize, Serialize};

/// Account as returned by `listAccounts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    /// 0 = user, 1 = root admin, 2 = domain admin
    #[serde(rename = "accounttype", default)]
    pub account_type: i32,
    #[serde(rename = "roletype", default)]
    pub role_type: Option<String>,
    #[serde(default)]
    pub domain: String,
    #[serde(rename = "domainid", default)]
    pub domain_id: String,
    #[serde(default)]
    pub state: String,
}

/// User as returned by `listUsers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(rename = "firstname", default)]
    pub first_name: String,
    #[serde(rename = "lastname", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub state: String,
}

/// `listAccounts` payload. CloudStack omits the item key entirely when empty.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListAccountsResponse {
    #[serde(default)]
    pub account: Vec<Account>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListUsersResponse {
    #[serde(default)]
    pub user: Vec<User>,
}
