//! Turning refspec text into an [`UpdateSpec`].

use skiff_refs::{Direction, RefSpec, REFS_PREFIX};

use crate::error::{PushError, PushResult};
use crate::repository::Repository;
use crate::types::UpdateSpec;

/// Parse and check one push refspec.
///
/// The destination must be a full name under `refs/`. A non-empty source
/// must resolve to an object in `repo`; a source that is well-formed but
/// names nothing yields [`PushError::ReferenceNotFound`], anything
/// malformed yields [`PushError::InvalidReference`]. Object ids are left
/// null for the work resolver.
pub fn parse_push_refspec(repo: &Repository, text: &str) -> PushResult<UpdateSpec> {
    let refspec = RefSpec::parse(text, Direction::Push).map_err(|e| PushError::InvalidReference {
        name: text.to_string(),
        reason: e.to_string(),
    })?;

    if refspec.is_glob() {
        return Err(PushError::InvalidReference {
            name: text.to_string(),
            reason: "wildcard refspecs cannot be pushed directly".into(),
        });
    }
    if !refspec.dst.starts_with(REFS_PREFIX) {
        return Err(PushError::InvalidReference {
            name: refspec.dst.clone(),
            reason: "not a valid reference name".into(),
        });
    }
    if !refspec.src.is_empty() {
        repo.rev_parse_single(&refspec.src)?;
    }

    Ok(UpdateSpec::from_refspec(refspec))
}
