// deployer/src/runner.rs

use crate::{
    error::{DeployError, Result},
    toolkit::{Deployment, Toolkit},
};
use std::io::Write;
use tracing::{error, info};

/// Blueprint this tool deploys.
pub const CONTRACT_NAME: &str = "MetaVaultProtocol";

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

/// Resolve, submit and confirm a single deployment. A failure at any step is
/// returned as-is: nothing is retried or rolled back.
pub async fn deploy_contract<T: Toolkit>(toolkit: &T, name: &str) -> Result<Deployment> {
    info!(contract = name, "Resolving contract factory");
    let factory = toolkit.contract_factory(name).await?;
    let pending = toolkit.deploy(factory).await?;
    toolkit.deployed(pending).await
}

/// The line printed on success.
pub fn success_line(name: &str, deployment: &Deployment) -> String {
    format!("{name} contract deployed to: {:?}", deployment.address)
}

/// Writes the outcome and returns the process exit status. Stdout only ever
/// receives the success line.
pub fn report<O, E>(name: &str, result: Result<Deployment>, stdout: &mut O, stderr: &mut E) -> u8
where
    O: Write,
    E: Write,
{
    let failure = match result {
        Ok(deployment) => match writeln!(stdout, "{}", success_line(name, &deployment)) {
            Ok(()) => return EXIT_SUCCESS,
            Err(e) => DeployError::Output(e),
        },
        Err(e) => e,
    };

    error!(contract = name, "Deployment failed");
    let report = eyre::Report::new(failure).wrap_err(format!("{name} deployment failed"));
    let _ = writeln!(stderr, "Error: {report:?}");
    EXIT_FAILURE
}

/// One full invocation: deploy once, report, return the exit status.
pub async fn run<T, O, E>(toolkit: &T, name: &str, stdout: &mut O, stderr: &mut E) -> u8
where
    T: Toolkit,
    O: Write,
    E: Write,
{
    let result = deploy_contract(toolkit, name).await;
    report(name, result, stdout, stderr)
}
