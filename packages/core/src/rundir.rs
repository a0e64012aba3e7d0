//! Run directory override from process arguments.

use std::ffi::OsStr;
use std::path::PathBuf;

/// Flag selecting the run directory.
pub const RUNDIR_FLAG: &str = "--rundir";

/// Find the value following `--rundir` in `args`.
///
/// Returns `None` when the flag is absent or is the last argument.
pub fn find_rundir<I, S>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg.as_ref() == OsStr::new(RUNDIR_FLAG) {
            return args.next().map(|value| PathBuf::from(value.as_ref()));
        }
    }
    None
}
