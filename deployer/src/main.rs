// deployer/src/main.rs

use metavault_deploy::{
    deploy_contract, load_config, logging::init_logging, report, EthersToolkit, CONTRACT_NAME,
};
use std::{io, process::ExitCode};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let result = async {
        let config = load_config()?;
        let toolkit = EthersToolkit::connect(&config).await?;
        deploy_contract(&toolkit, CONTRACT_NAME).await
    }
    .await;

    let code = report(CONTRACT_NAME, result, &mut io::stdout().lock(), &mut io::stderr().lock());
    ExitCode::from(code)
}
