//! Command-line front end for the self-service policy wizard.
//!
//! Drives the same session state machine the browser UI uses: service and
//! resource selection, permission flags, compilation, then optional
//! submission to the review backend.

mod output;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use iam_request_wizard_client::BackendClient;
use iam_request_wizard_core::{
    ResourceSpec, ServiceChoice, TemporalMetadata, WizardSession,
};

#[derive(Parser)]
#[command(
    name = "iam-request-wizard",
    version,
    about = "Compile and submit IAM policy requests for human review"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a policy document from wizard selections and print it
    Compile(CompileArgs),
    /// Compile a policy and submit it to the review backend
    Submit(SubmitArgs),
    /// List the roles the caller may request changes for
    Roles(RolesArgs),
}

#[derive(Args)]
struct CompileArgs {
    /// Service to request access to (s3, sqs, sns, sts, r53, ec2, rds, ses, custom)
    #[arg(long)]
    service: String,

    /// S3 bucket name or bucket ARN
    #[arg(long)]
    bucket: Option<String>,

    /// S3 key prefix; normalized to /{prefix}/*
    #[arg(long, default_value = "")]
    prefix: String,

    /// Also request {region}.{bucket} S3 ARNs for the standard regions
    #[arg(long)]
    multiregion: bool,

    /// Queue, topic, or role ARN (SQS, SNS, STS)
    #[arg(long)]
    resource_arn: Option<String>,

    /// Account owning the rds-monitoring-role (RDS)
    #[arg(long)]
    rds_account_id: Option<String>,

    /// Requested sending address (SES)
    #[arg(long)]
    from_address: Option<String>,

    /// SES identity ARN configured for the deployment
    #[arg(long)]
    identity_arn: Option<String>,

    /// Permission flags to request, comma separated (e.g. list,get)
    #[arg(long, value_delimiter = ',')]
    permissions: Vec<String>,

    /// Mark the request as temporary access
    #[arg(long)]
    temporary: bool,

    /// Expiration date for temporary access (YYYY-MM-DD)
    #[arg(long)]
    expires: Option<NaiveDate>,
}

impl CompileArgs {
    fn service(&self) -> Result<ServiceChoice> {
        self.service
            .parse()
            .with_context(|| format!("unsupported --service '{}'", self.service))
    }

    fn resource_spec(&self) -> Result<ResourceSpec> {
        let spec = match self.service()? {
            ServiceChoice::S3 => ResourceSpec::S3 {
                bucket: self
                    .bucket
                    .clone()
                    .context("--bucket is required for s3")?,
                prefix: self.prefix.clone(),
                multiregion: self.multiregion,
            },
            ServiceChoice::Sqs => ResourceSpec::Sqs {
                queue_arn: self
                    .resource_arn
                    .clone()
                    .context("--resource-arn is required for sqs")?,
            },
            ServiceChoice::Sns => ResourceSpec::Sns {
                topic_arn: self
                    .resource_arn
                    .clone()
                    .context("--resource-arn is required for sns")?,
            },
            ServiceChoice::Sts => ResourceSpec::Sts {
                role_arn: self
                    .resource_arn
                    .clone()
                    .context("--resource-arn is required for sts")?,
            },
            ServiceChoice::R53 => ResourceSpec::R53,
            ServiceChoice::Ec2 => ResourceSpec::Ec2,
            ServiceChoice::Rds => ResourceSpec::Rds {
                account_id: self
                    .rds_account_id
                    .clone()
                    .context("--rds-account-id is required for rds")?,
            },
            ServiceChoice::Ses => ResourceSpec::Ses {
                from_address: self
                    .from_address
                    .clone()
                    .context("--from-address is required for ses")?,
                identity_arn: self
                    .identity_arn
                    .clone()
                    .context("--identity-arn is required for ses")?,
            },
            ServiceChoice::Custom => {
                bail!("custom requests carry a user-written policy; nothing to compile")
            }
        };
        Ok(spec)
    }

    fn temporal(&self) -> Result<TemporalMetadata> {
        if self.temporary {
            let date = self
                .expires
                .context("--expires is required with --temporary")?;
            Ok(TemporalMetadata::expiring(date))
        } else if self.expires.is_some() {
            bail!("--expires only makes sense together with --temporary")
        } else {
            Ok(TemporalMetadata::default())
        }
    }
}

#[derive(Args)]
struct SubmitArgs {
    #[command(flatten)]
    compile: CompileArgs,

    /// Review backend base URL
    #[arg(long, env = "WIZARD_BACKEND_URL")]
    url: String,

    /// Role ARN the requested policy attaches to
    #[arg(long)]
    role_arn: String,

    /// Account the role lives in
    #[arg(long)]
    account_id: String,

    /// Reason shown to reviewers
    #[arg(long)]
    justification: String,

    /// CSRF token from the backend's _xsrf cookie
    #[arg(long, env = "WIZARD_XSRF_TOKEN")]
    xsrf_token: String,
}

#[derive(Args)]
struct RolesArgs {
    /// Review backend base URL
    #[arg(long, env = "WIZARD_BACKEND_URL")]
    url: String,
}

fn run_compile(args: &CompileArgs) -> Result<()> {
    let spec = args.resource_spec()?;
    let selection =
        iam_request_wizard_core::PermissionSelection::from_flags(args.permissions.clone());
    let compiled = iam_request_wizard_core::compile(&spec, &selection, &args.temporal()?)
        .context("failed to compile policy")?;

    output::note(&format!("generated policy '{}'", compiled.policy_name));
    if compiled.document.statement[0].action.is_empty()
        && spec.service() != ServiceChoice::Custom
    {
        output::warn("no permission flags selected; the statement has an empty Action list");
    }

    println!("{}", serde_json::to_string_pretty(&compiled.document)?);
    Ok(())
}

async fn run_submit(args: &SubmitArgs) -> Result<()> {
    let mut session = WizardSession::new(args.account_id.clone())?;
    session.set_role_arn(args.role_arn.as_str());
    session.choose_service(args.compile.service()?);
    session.next_page().context("resource selection invalid")?;

    session.set_resource(args.compile.resource_spec()?)?;
    for flag in &args.compile.permissions {
        session.set_permission(flag.clone(), true);
    }
    session.set_temporal(args.compile.temporal()?);
    session.next_page().context("permission selection invalid")?;

    let request = session.build_submission(&args.justification)?;

    let client = BackendClient::new(&args.url)?.with_xsrf_token(args.xsrf_token.as_str());
    session.begin_submission();
    output::print_submission_state(session.submission_state());

    match client.submit_for_review(&request).await {
        Ok(request_id) => {
            session.finish_submission(Ok(request_id));
            output::print_submission_state(session.submission_state());
            Ok(())
        }
        Err(error) => {
            session.finish_submission(Err(error.to_string()));
            output::print_submission_state(session.submission_state());
            bail!("submission failed: {error}")
        }
    }
}

async fn run_roles(args: &RolesArgs) -> Result<()> {
    let client = BackendClient::new(&args.url)?;
    let roles = client
        .eligible_roles()
        .await
        .context("failed to list eligible roles")?;
    output::print_roles(&roles);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Command::Compile(args) => run_compile(args),
        Command::Submit(args) => run_submit(args).await,
        Command::Roles(args) => run_roles(args).await,
    }
}
