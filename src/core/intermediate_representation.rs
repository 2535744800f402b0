use std::slice;

use crate::core::parser::{self, ast};

/// Where one standard stream of a process is connected.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Stdio {
    Inherit,
    /// The pipe between the two sides of a pipeline.
    Pipe,
    /// Read from (stdin) or truncate and write to (stdout) a file.
    Filename(String),
    /// Write to the end of a file. Only used for stdout.
    AppendFilename(String),
}

impl Default for Stdio {
    fn default() -> Self {
        Stdio::Inherit
    }
}

impl From<ast::Redirect> for Stdio {
    fn from(redirect: ast::Redirect) -> Self {
        match redirect.instruction {
            ast::RedirectInstruction::Input | ast::RedirectInstruction::Output => {
                Stdio::Filename(redirect.filename)
            }
            ast::RedirectInstruction::Append => Stdio::AppendFilename(redirect.filename),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SimpleCommand {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Stdio,
    pub stdout: Stdio,
}

impl SimpleCommand {
    pub fn argv(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Simple(SimpleCommand),
    Pipeline([SimpleCommand; 2]),
}

impl Command {
    /// The processes to launch, in pipeline order.
    pub fn stages(&self) -> &[SimpleCommand] {
        match self {
            Command::Simple(simple_command) => slice::from_ref(simple_command),
            Command::Pipeline(stages) => &stages[..],
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct CommandGroup {
    pub input: String,
    pub command: Command,
}

#[derive(Debug)]
pub struct Interpreter;

impl Interpreter {
    pub fn parse(input: parser::Command) -> CommandGroup {
        let command = match input.inner {
            ast::Command::Simple(simple_command) => {
                Command::Simple(lower_simple_command(simple_command, None, None))
            }
            ast::Command::Pipeline(first, second) => Command::Pipeline([
                lower_simple_command(first, None, Some(Stdio::Pipe)),
                lower_simple_command(second, Some(Stdio::Pipe), None),
            ]),
        };

        CommandGroup {
            input: input.input,
            command,
        }
    }
}

/// File redirects take precedence over pipes, following bash's behavior.
fn lower_simple_command(
    command: ast::SimpleCommand,
    pipe_stdin: Option<Stdio>,
    pipe_stdout: Option<Stdio>,
) -> SimpleCommand {
    let stdin = get_stdin_redirect(&command.redirects)
        .cloned()
        .map(Stdio::from)
        .or(pipe_stdin)
        .unwrap_or_default();
    let stdout = get_stdout_redirect(&command.redirects)
        .cloned()
        .map(Stdio::from)
        .or(pipe_stdout)
        .unwrap_or_default();

    let mut words = command.words.into_iter();
    let program = words.next().unwrap_or_default();
    SimpleCommand {
        program,
        args: words.collect(),
        stdin,
        stdout,
    }
}

/// Gets the last stdin redirect in `redirects`
fn get_stdin_redirect(redirects: &[ast::Redirect]) -> Option<&ast::Redirect> {
    redirects.iter().rev().find(|r| r.instruction.is_input())
}

/// Gets the last stdout redirect in `redirects`
fn get_stdout_redirect(redirects: &[ast::Redirect]) -> Option<&ast::Redirect> {
    redirects.iter().rev().find(|r| !r.instruction.is_input())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SimpleCommandBuilder(SimpleCommand);

    impl SimpleCommandBuilder {
        fn new(program: &str) -> Self {
            SimpleCommandBuilder(SimpleCommand {
                program: program.into(),
                args: vec![],
                stdin: Stdio::Inherit,
                stdout: Stdio::Inherit,
            })
        }

        fn arg(mut self, arg: &str) -> Self {
            self.0.args.push(arg.to_string());
            self
        }

        fn stdin(self, stdin: Stdio) -> Self {
            SimpleCommandBuilder(SimpleCommand { stdin, ..self.0 })
        }

        fn stdout(self, stdout: Stdio) -> Self {
            SimpleCommandBuilder(SimpleCommand { stdout, ..self.0 })
        }

        fn build(self) -> SimpleCommand {
            self.0
        }
    }

    fn interpret(line: &str) -> CommandGroup {
        let command = parser::Command::parse(line)
            .expect("line should parse")
            .expect("line should not be empty");
        Interpreter::parse(command)
    }

    #[test]
    fn test_simple_command() {
        assert_eq!(
            interpret("echo test"),
            CommandGroup {
                input: "echo test".into(),
                command: Command::Simple(SimpleCommandBuilder::new("echo").arg("test").build()),
            }
        );
    }

    #[test]
    fn test_stdin_redirects() {
        assert_eq!(
            interpret("cat < in").command,
            Command::Simple(
                SimpleCommandBuilder::new("cat")
                    .stdin(Stdio::Filename("in".into()))
                    .build()
            )
        );

        assert_eq!(
            interpret("< in1 cat < in2").command,
            Command::Simple(
                SimpleCommandBuilder::new("cat")
                    .stdin(Stdio::Filename("in2".into()))
                    .build()
            )
        );
    }

    #[test]
    fn test_stdout_redirects() {
        assert_eq!(
            interpret("echo test > out").command,
            Command::Simple(
                SimpleCommandBuilder::new("echo")
                    .arg("test")
                    .stdout(Stdio::Filename("out".into()))
                    .build()
            )
        );

        assert_eq!(
            interpret("echo test > out1 >> out2").command,
            Command::Simple(
                SimpleCommandBuilder::new("echo")
                    .arg("test")
                    .stdout(Stdio::AppendFilename("out2".into()))
                    .build()
            )
        );

        assert_eq!(
            interpret("echo test >> out1 > out2").command,
            Command::Simple(
                SimpleCommandBuilder::new("echo")
                    .arg("test")
                    .stdout(Stdio::Filename("out2".into()))
                    .build()
            )
        );
    }

    #[test]
    fn test_pipeline_wiring() {
        let group = interpret("echo hi | wc -c");
        assert_eq!(
            group.command,
            Command::Pipeline([
                SimpleCommandBuilder::new("echo")
                    .arg("hi")
                    .stdout(Stdio::Pipe)
                    .build(),
                SimpleCommandBuilder::new("wc")
                    .arg("-c")
                    .stdin(Stdio::Pipe)
                    .build(),
            ])
        );
        assert_eq!(group.command.stages().len(), 2);
    }

    #[test]
    fn test_file_redirect_beats_pipe() {
        assert_eq!(
            interpret("cat < a > b | sort < c > d").command,
            Command::Pipeline([
                SimpleCommandBuilder::new("cat")
                    .stdin(Stdio::Filename("a".into()))
                    .stdout(Stdio::Filename("b".into()))
                    .build(),
                SimpleCommandBuilder::new("sort")
                    .stdin(Stdio::Filename("c".into()))
                    .stdout(Stdio::Filename("d".into()))
                    .build(),
            ])
        );
    }

    #[test]
    fn test_argv() {
        let command = SimpleCommandBuilder::new("ls").arg("-l").arg("/").build();
        assert_eq!(command.argv(), "ls -l /");
    }
}
