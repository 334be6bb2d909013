use super::*;

pub(crate) struct CommandBuilder {
    args: Vec<String>,
    env: Vec<(String, String)>,
    tempdir: Arc<TempDir>,
}

impl CommandBuilder {
    pub(crate) fn new(args: impl ToArgs) -> Self {
        Self {
            args: args.to_args(),
            env: Vec::new(),
            tempdir: Arc::new(TempDir::new().unwrap()),
        }
    }

    pub(crate) fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub(crate) fn tempdir(self, tempdir: Arc<TempDir>) -> Self {
        Self { tempdir, ..self }
    }

    pub(crate) fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_scryptpool"));

        command
            .env_remove("RUST_LOG")
            .envs(self.env.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(&*self.tempdir)
            .args(&self.args);

        command
    }

    #[track_caller]
    pub(crate) fn spawn(self) -> Child {
        self.command().spawn().unwrap()
    }

    #[track_caller]
    pub(crate) fn run_and_extract_stdout(self) -> String {
        let output = self.command().output().unwrap();

        assert!(
            output.status.success(),
            "command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        String::from_utf8(output.stdout).unwrap()
    }

    #[track_caller]
    pub(crate) fn expect_failure(self) -> String {
        let output = self.command().output().unwrap();

        assert_eq!(output.status.code(), Some(1));

        String::from_utf8(output.stderr).unwrap()
    }
}
