//! Merging of per-family accepted log group names.

use std::collections::BTreeSet;

/// Merge the REST and HTTP accepted log group names into one deduplicated
/// list, sorted so that repeated runs produce identical output.
pub fn assemble_log_group_names<R, H>(rest: R, http: H) -> Vec<String>
where
    R: IntoIterator<Item = String>,
    H: IntoIterator<Item = String>,
{
    rest.into_iter()
        .chain(http)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
