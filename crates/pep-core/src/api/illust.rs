//! `GET /ajax/illust/{id}`: title and author of a work.

use serde::Deserialize;

use super::envelope::decode_body;
use super::ApiError;

/// The subset of illustration details used for naming files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllustMetadata {
    pub title: String,
    pub author_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IllustBody {
    title: String,
    user_name: String,
}

pub(crate) fn parse_illust(bytes: &[u8]) -> Result<IllustMetadata, ApiError> {
    let body: IllustBody = decode_body(bytes)?;
    Ok(IllustMetadata {
        title: body.title,
        author_name: body.user_name,
    })
}
