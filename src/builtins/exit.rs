use log::debug;
use serde_derive::Deserialize;

use crate::builtins::{self, prelude::*};

pub struct Exit;

#[derive(Debug, Deserialize)]
struct ExitArgs {}

impl builtins::BuiltinCommand for Exit {
    const NAME: &'static str = builtins::EXIT_NAME;

    const HELP: &'static str = "\
Usage: exit

Exit the shell. Refused while there are suspended jobs.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let args: ExitArgs = parse_args(Self::HELP, Self::NAME, args.iter().map(AsRef::as_ref))?;
        debug!("{:?}", args);

        if shell.has_suspended_jobs() {
            return Err(ErrorKind::PendingJobs.into());
        }

        shell.request_exit();
        Ok(())
    }
}
