use std::collections::HashSet;

use crate::sync_engine::types::SyncPlan;

/// Reconcile local and remote name sets.
///
/// `to_upload = local \ remote`, `to_download = remote \ local`, compared with
/// exact, case-sensitive equality. Each output keeps the first-appearance
/// order of its input and lists every name once.
pub fn plan<L, R>(local_names: &[L], remote_names: &[R]) -> SyncPlan
where
    L: AsRef<str>,
    R: AsRef<str>,
{
    let local: HashSet<&str> = local_names.iter().map(|n| n.as_ref()).collect();
    let remote: HashSet<&str> = remote_names.iter().map(|n| n.as_ref()).collect();

    SyncPlan {
        to_upload: difference(local_names, &remote),
        to_download: difference(remote_names, &local),
    }
}

fn difference<T: AsRef<str>>(names: &[T], exclude: &HashSet<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|n| n.as_ref())
        .filter(|name| !exclude.contains(name) && seen.insert(*name))
        .map(str::to_string)
        .collect()
}
