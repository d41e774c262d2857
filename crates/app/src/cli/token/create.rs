use bazaar_app::{
    auth::{PgAuthService, Principal, Role},
    database,
};
use clap::Args;
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CreateTokenArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Principal UUID that should own the token; generated when omitted
    #[arg(long)]
    principal_uuid: Option<Uuid>,

    /// Role granted to the principal (admin, seller, customer)
    #[arg(long, default_value = "admin")]
    role: Role,
}

pub(crate) async fn run(args: CreateTokenArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let service = PgAuthService::new(pool);

    let issued = service
        .issue_api_token(Principal {
            uuid: args.principal_uuid.unwrap_or_else(Uuid::now_v7),
            role: args.role,
        })
        .await
        .map_err(|error| format!("failed to create token: {error}"))?;

    println!("token_uuid: {}", issued.metadata.uuid);
    println!("principal_uuid: {}", issued.metadata.principal.uuid);
    println!("role: {}", issued.metadata.principal.role);
    println!("token_version: {}", issued.metadata.version.as_i16());
    println!("token_created_at: {}", issued.metadata.created_at);
    println!("api_token: {}", issued.token);
    println!("store this token now; it is only shown once");

    Ok(())
}
