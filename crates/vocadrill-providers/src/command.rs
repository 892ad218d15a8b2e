//! External command translator.
//!
//! Pipes the text to a program's stdin and reads the translation from its
//! stdout. `{source}` and `{target}` in the arguments are replaced with the
//! language codes, so any local MT tool or script can join the chain.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::instrument;

use vocadrill_core::error::TranslateError;
use vocadrill_core::traits::{TranslateRequest, TranslateResponse, Translator};

/// Translator that runs an external program.
pub struct CommandTranslator {
    name: String,
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    timeout_secs: u64,
}

impl CommandTranslator {
    pub fn new(name: &str, program: &str, args: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            args,
            env: HashMap::new(),
            timeout_secs,
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    fn args_for(&self, request: &TranslateRequest) -> Vec<String> {
        self.args
            .iter()
            .map(|a| {
                a.replace("{source}", &request.source_language)
                    .replace("{target}", &request.target_language)
            })
            .collect()
    }

    async fn run(&self, request: &TranslateRequest) -> Result<String, TranslateError> {
        let mut child = Command::new(&self.program)
            .args(self.args_for(request))
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TranslateError::Io(format!("failed to start {}: {e}", self.program)))?;

        // Feed stdin while draining stdout so neither pipe can fill up and stall.
        let stdin = child.stdin.take();
        let input = request.text.as_bytes();
        let write = async move {
            if let Some(mut stdin) = stdin {
                // Programs that ignore stdin may exit before we finish writing.
                if let Err(e) = stdin.write_all(input).await {
                    if e.kind() != std::io::ErrorKind::BrokenPipe {
                        return Err(TranslateError::Io(e.to_string()));
                    }
                }
            }
            Ok(())
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());
        written?;
        let output = output.map_err(|e| TranslateError::Io(e.to_string()))?;

        if !output.status.success() {
            return Err(TranslateError::CommandFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(TranslateError::Empty);
        }
        Ok(text)
    }
}

#[async_trait]
impl Translator for CommandTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, request), fields(translator = %self.name, program = %self.program))]
    async fn translate(&self, request: &TranslateRequest) -> anyhow::Result<TranslateResponse> {
        let start = Instant::now();
        let timeout = Duration::from_secs(self.timeout_secs);

        let text = match tokio::time::timeout(timeout, self.run(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(TranslateError::Timeout(self.timeout_secs).into()),
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(latency_ms, "translation received");

        Ok(TranslateResponse {
            text,
            translator: self.name.clone(),
            latency_ms,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn request(text: &str) -> TranslateRequest {
        TranslateRequest::new(text, "ja", "en")
    }

    #[tokio::test]
    async fn pipes_text_through_program() {
        let t = CommandTranslator::new("echo", "cat", vec![], 5);
        let response = t.translate(&request("  猫が好き\n")).await.unwrap();
        assert_eq!(response.text, "猫が好き");
        assert_eq!(response.translator, "echo");
    }

    #[tokio::test]
    async fn large_output_before_reading_input() {
        let t = CommandTranslator::new(
            "chatty",
            "sh",
            vec![
                "-c".into(),
                "head -c 200000 /dev/zero | tr '\\0' a; cat > /dev/null".into(),
            ],
            5,
        );
        let input = "x".repeat(300_000);
        let response = t.translate(&request(&input)).await.unwrap();
        assert_eq!(response.text.len(), 200_000);
    }

    #[tokio::test]
    async fn substitutes_language_placeholders() {
        let t = CommandTranslator::new(
            "sh",
            "sh",
            vec!["-c".into(), "echo \"$0 $1\"".into(), "{source}".into(), "{target}".into()],
            5,
        );
        let response = t.translate(&request("ignored")).await.unwrap();
        assert_eq!(response.text, "ja en");
    }

    #[tokio::test]
    async fn passes_environment() {
        let env = HashMap::from([("VOCADRILL_TEST_GREETING".to_string(), "hallo".to_string())]);
        let t = CommandTranslator::new(
            "sh",
            "sh",
            vec!["-c".into(), "echo $VOCADRILL_TEST_GREETING".into()],
            5,
        )
        .with_env(env);
        let response = t.translate(&request("x")).await.unwrap();
        assert_eq!(response.text, "hallo");
    }

    #[tokio::test]
    async fn non_zero_exit_is_command_failed() {
        let t = CommandTranslator::new(
            "fail",
            "sh",
            vec!["-c".into(), "echo broken >&2; exit 3".into()],
            5,
        );
        let err = t.translate(&request("x")).await.unwrap_err();
        match err.downcast_ref::<TranslateError>() {
            Some(TranslateError::CommandFailed { status, stderr }) => {
                assert_eq!(*status, 3);
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_output_is_permanent() {
        let t = CommandTranslator::new("true", "true", vec![], 5);
        let err = t.translate(&request("x")).await.unwrap_err();
        assert!(err.downcast_ref::<TranslateError>().unwrap().is_permanent());
    }

    #[tokio::test]
    async fn missing_program_is_io_error() {
        let t = CommandTranslator::new("nope", "/nonexistent/vocadrill-translator", vec![], 5);
        let err = t.translate(&request("x")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TranslateError>(),
            Some(TranslateError::Io(_))
        ));
    }

    #[tokio::test]
    async fn slow_program_times_out() {
        let t = CommandTranslator::new("slow", "sleep", vec!["5".into()], 1);
        let err = t.translate(&request("x")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TranslateError>(),
            Some(TranslateError::Timeout(1))
        ));
    }
}
