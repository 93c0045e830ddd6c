use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::Result;
use crate::media::{MediaItem, SourceId};
use crate::name_codec::{self, EncodeOutcome};
use crate::writer::FsMutator;

/// What to do with one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RenameVerdict {
    SkipNoReferenceDate,
    SkipAlreadyCorrect,
    SkipAlreadyNormalized,
    RenameToReferenceDate {
        source: SourceId,
        date: NaiveDateTime,
    },
}

/// Decide whether `item` should be renamed.
///
/// `references` is tried in order and the first source with a date wins: a
/// single folder reference is just a one-element list. With `force`, names
/// that are canonical for some other date are renamed too.
pub fn plan_rename(item: &MediaItem, references: &[SourceId], force: bool) -> RenameVerdict {
    let Some((source, date)) = references
        .iter()
        .find_map(|&source| item.date(source).map(|date| (source, date)))
    else {
        return RenameVerdict::SkipNoReferenceDate;
    };

    if name_codec::is_normalized_for(&item.filename, date) {
        RenameVerdict::SkipAlreadyCorrect
    } else if !force && item.normalized {
        RenameVerdict::SkipAlreadyNormalized
    } else {
        RenameVerdict::RenameToReferenceDate { source, date }
    }
}

/// Rename `item` after `date`, returning the new path, or `None` when the
/// file turned out to carry its canonical name already.
pub fn apply_rename(item: &MediaItem, date: NaiveDateTime, mutator: &dyn FsMutator) -> Result<Option<PathBuf>> {
    let dir = item.dir();
    let outcome = name_codec::encode_name(&item.filename, date, |name| mutator.name_taken(dir, name))?;
    match outcome {
        EncodeOutcome::AlreadyNamed => Ok(None),
        EncodeOutcome::NewName(name) => {
            let dest = mutator.rename(&item.path, &name)?;
            tracing::debug!(from = %item.path.display(), to = %dest.display(), "renamed");
            Ok(Some(dest))
        }
    }
}
