use std::env;

use log::debug;
use serde_derive::Deserialize;

use crate::builtins::{self, prelude::*};

pub struct Cd;

#[derive(Debug, Deserialize)]
struct CdArgs {
    arg_dir: String,
}

impl builtins::BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    const HELP: &'static str = "\
Usage: cd <dir>

Change the shell working directory to DIR.";

    fn run<T: AsRef<str>>(_shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let args: CdArgs = parse_args(Self::HELP, Self::NAME, args.iter().map(AsRef::as_ref))?;
        debug!("{:?}", args);

        env::set_current_dir(&args.arg_dir).context(ErrorKind::InvalidDirectory)?;
        Ok(())
    }
}
