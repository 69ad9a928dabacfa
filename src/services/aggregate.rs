//! Concurrent fan-out of independent reads.
//!
//! The first read to fail decides the outcome; the others are dropped
//! unfinished.

use std::future::Future;

use futures::future::try_join_all;
use indexmap::IndexMap;

use super::not_found;
use crate::{error::AppResult, models::EntityKind};

/// Run named reads of the same type concurrently, joined in input order
pub async fn join_named<T, F>(
    reads: Vec<(&'static str, F)>,
) -> AppResult<IndexMap<&'static str, T>>
where
    F: Future<Output = AppResult<T>>,
{
    let (names, futures): (Vec<_>, Vec<_>) = reads.into_iter().unzip();
    let results = try_join_all(futures).await?;
    Ok(names.into_iter().zip(results).collect())
}

/// Run a primary lookup and a secondary read concurrently.
///
/// An absent primary of kind `kind` becomes `NotFound`, even when the
/// secondary read came back empty.
pub async fn with_primary<P, S, FP, FS>(
    primary: FP,
    secondary: FS,
    kind: EntityKind,
) -> AppResult<(P, S)>
where
    FP: Future<Output = AppResult<Option<P>>>,
    FS: Future<Output = AppResult<S>>,
{
    let (primary, secondary) = tokio::try_join!(primary, secondary)?;
    match primary {
        Some(primary) => Ok((primary, secondary)),
        None => Err(not_found(kind)),
    }
}
