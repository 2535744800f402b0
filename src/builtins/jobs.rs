use log::debug;
use serde_derive::Deserialize;

use crate::builtins::{self, prelude::*};
use crate::core::job::JobId;

pub struct Jobs;

#[derive(Debug, Deserialize)]
struct JobsArgs {}

impl builtins::BuiltinCommand for Jobs {
    const NAME: &'static str = builtins::JOBS_NAME;

    const HELP: &'static str = "\
Usage: jobs

List suspended jobs as `[index] command`, in the order they were suspended.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let args: JobsArgs = parse_args(Self::HELP, Self::NAME, args.iter().map(AsRef::as_ref))?;
        debug!("{:?}", args);

        for job in shell.job_table().list() {
            writeln!(stdout, "{}", job).context(ErrorKind::Io)?;
        }

        Ok(())
    }
}

pub struct Fg;

#[derive(Debug, Deserialize)]
struct FgArgs {
    arg_index: String,
}

impl builtins::BuiltinCommand for Fg {
    const NAME: &'static str = builtins::FG_NAME;

    const HELP: &'static str = "\
Usage: fg <index>

Continue the suspended job at INDEX and wait for it in the foreground.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let args: FgArgs = parse_args(Self::HELP, Self::NAME, args.iter().map(AsRef::as_ref))?;
        debug!("{:?}", args);

        // An index that is not a number names no job.
        let index = args
            .arg_index
            .parse::<u32>()
            .map_err(|_| Error::invalid_job())?;
        shell.put_job_in_foreground(JobId(index))
    }
}
