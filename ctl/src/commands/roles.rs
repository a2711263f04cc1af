use clap::Subcommand;
use keystone_auth::{marshal_cert_roles, unmarshal_cert_roles};

#[derive(Clone, Subcommand)]
pub enum RolesCommand {
    /// Print the envelope for the given roles.
    Encode {
        #[clap(required = true)]
        roles: Vec<String>,
    },

    /// Print the roles held in an envelope, one per line.
    Decode { envelope: String },
}

pub fn roles(command: RolesCommand) -> anyhow::Result<()> {
    match command {
        RolesCommand::Encode { roles } => println!("{}", marshal_cert_roles(&roles)?),
        RolesCommand::Decode { envelope } => {
            for role in unmarshal_cert_roles(&envelope)? {
                println!("{role}");
            }
        }
    }
    Ok(())
}
