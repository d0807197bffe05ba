// tests/deploy_runner_test.rs
// Drives the runner through a scripted toolkit; no node required.

use ethers::types::{Address, TxHash};
use metavault_deploy::{
    run, Deployment, DeployError, Toolkit, CONTRACT_NAME, EXIT_FAILURE, EXIT_SUCCESS,
};
use std::{io, sync::Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Resolve,
    Submit,
    Confirm,
}

/// Succeeds at every step except `fail_at`, recording each call.
struct ScriptedToolkit {
    known: &'static str,
    fail_at: Option<Step>,
    calls: Mutex<Vec<Step>>,
}

impl ScriptedToolkit {
    fn healthy() -> Self {
        Self {
            known: CONTRACT_NAME,
            fail_at: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_at(step: Step) -> Self {
        Self {
            fail_at: Some(step),
            ..Self::healthy()
        }
    }

    fn record(&self, step: Step) -> bool {
        self.calls.lock().unwrap().push(step);
        self.fail_at == Some(step)
    }

    fn calls(&self) -> Vec<Step> {
        self.calls.lock().unwrap().clone()
    }
}

impl Toolkit for ScriptedToolkit {
    type Factory = String;
    type Pending = TxHash;

    async fn contract_factory(&self, name: &str) -> Result<String, DeployError> {
        if self.record(Step::Resolve) || name != self.known {
            return Err(DeployError::BlueprintNotFound(name.to_string()));
        }
        Ok(name.to_string())
    }

    async fn deploy(&self, _factory: String) -> Result<TxHash, DeployError> {
        if self.record(Step::Submit) {
            let cause = io::Error::new(io::ErrorKind::Other, "insufficient funds for gas * price + value");
            return Err(DeployError::Submission(cause.into()));
        }
        Ok(TxHash::repeat_byte(0x11))
    }

    async fn deployed(&self, pending: TxHash) -> Result<Deployment, DeployError> {
        if self.record(Step::Confirm) {
            return Err(DeployError::Dropped(pending));
        }
        Ok(Deployment {
            address: Address::repeat_byte(0x5f),
            transaction_hash: pending,
            block_number: Some(1u64.into()),
            gas_used: Some(21_000u64.into()),
        })
    }
}

struct Outcome {
    code: u8,
    stdout: String,
    stderr: String,
}

async fn invoke(toolkit: &ScriptedToolkit, name: &str) -> Outcome {
    let (mut out, mut err) = (Vec::new(), Vec::new());
    let code = run(toolkit, name, &mut out, &mut err).await;
    Outcome {
        code,
        stdout: String::from_utf8(out).unwrap(),
        stderr: String::from_utf8(err).unwrap(),
    }
}

#[tokio::test]
async fn successful_deployment_prints_one_line_and_exits_zero() {
    let toolkit = ScriptedToolkit::healthy();
    let outcome = invoke(&toolkit, CONTRACT_NAME).await;

    assert_eq!(outcome.code, EXIT_SUCCESS);
    assert!(outcome.stderr.is_empty());
    let lines: Vec<&str> = outcome.stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    let address = lines[0]
        .strip_prefix("MetaVaultProtocol contract deployed to: ")
        .expect("missing success prefix");
    assert_eq!(address, "0x5f5f5f5f5f5f5f5f5f5f5f5f5f5f5f5f5f5f5f5f");
    assert_eq!(toolkit.calls(), vec![Step::Resolve, Step::Submit, Step::Confirm]);
}

#[tokio::test]
async fn unknown_blueprint_fails_without_stdout() {
    let toolkit = ScriptedToolkit::healthy();
    let outcome = invoke(&toolkit, "NoSuchContract").await;

    assert_eq!(outcome.code, EXIT_FAILURE);
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("artifact for contract NoSuchContract not found"));
    assert_eq!(toolkit.calls(), vec![Step::Resolve]);
}

#[tokio::test]
async fn rejected_submission_fails_with_cause() {
    let toolkit = ScriptedToolkit::failing_at(Step::Submit);
    let outcome = invoke(&toolkit, CONTRACT_NAME).await;

    assert_eq!(outcome.code, EXIT_FAILURE);
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("failed to submit deployment transaction"));
    assert!(outcome.stderr.contains("insufficient funds"));
    assert_eq!(toolkit.calls(), vec![Step::Resolve, Step::Submit]);
}

#[tokio::test]
async fn rejected_confirmation_fails() {
    let toolkit = ScriptedToolkit::failing_at(Step::Confirm);
    let outcome = invoke(&toolkit, CONTRACT_NAME).await;

    assert_eq!(outcome.code, EXIT_FAILURE);
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("dropped"));
}

#[tokio::test]
async fn each_step_is_attempted_exactly_once() {
    for step in [Step::Resolve, Step::Submit, Step::Confirm] {
        let toolkit = ScriptedToolkit::failing_at(step);
        let outcome = invoke(&toolkit, CONTRACT_NAME).await;
        assert_eq!(outcome.code, EXIT_FAILURE);

        let calls = toolkit.calls();
        assert_eq!(calls.iter().filter(|s| **s == step).count(), 1, "{step:?} retried");
        assert_eq!(calls.last(), Some(&step), "continued past failed {step:?}");
    }
}
