use serde::{Deserialize, Deserializer, Serialize};

use crate::provisioner::Provisioned;

/// Body of `POST` and `DELETE /repository`. Missing and `null` fields decode
/// as empty strings so the engine, not the decoder, rejects them.
#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProvisionRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub project: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub namespace: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProvisionResponse {
    #[serde(rename = "gitRemoteURL")]
    pub git_remote_url: String,
    #[serde(rename = "gitToken")]
    pub git_token: String,
    #[serde(rename = "gitUser")]
    pub git_user: String,
}

impl From<Provisioned> for ProvisionResponse {
    fn from(provisioned: Provisioned) -> Self {
        Self {
            git_remote_url: provisioned.git_remote_url,
            git_token: provisioned.git_token,
            git_user: provisioned.git_user,
        }
    }
}
