use clap::Subcommand;
use serde::Deserialize;
use tabled::{Table, Tabled};

use super::{parse, Session};

#[derive(Subcommand)]
pub enum RequestCommands {
    Create {
        #[arg(long)]
        farmer_name: String,
        #[arg(long)]
        produce: String,
        #[arg(short, long)]
        quantity: i64,
        #[arg(long)]
        pickup: String,
        #[arg(long)]
        destination: String,
    },
    Get {
        #[arg(short, long)]
        id: String,
    },
    List,
}

#[derive(Debug, Deserialize, Tabled)]
struct TransportRequest {
    #[tabled(rename = "ID")]
    request_id: String,
    #[tabled(rename = "Farmer")]
    farmer_name: String,
    #[tabled(rename = "Produce")]
    produce: String,
    #[tabled(rename = "Qty")]
    quantity: u64,
    #[tabled(rename = "Pickup")]
    pickup: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

pub async fn execute(command: RequestCommands, session: &Session) -> anyhow::Result<()> {
    match command {
        RequestCommands::Create {
            farmer_name,
            produce,
            quantity,
            pickup,
            destination,
        } => {
            let body = serde_json::json!({
                "farmer_name": farmer_name,
                "produce": produce,
                "quantity": quantity,
                "pickup": pickup,
                "destination": destination,
            });
            let response = session.post("/api/request")?.json(&body).send().await?;
            let request: TransportRequest = parse(response).await?;
            println!("Transport request submitted!");
            println!();
            println!("  ID: {}", request.request_id);
            println!("  Status: {}", request.status);
        }
        RequestCommands::Get { id } => {
            let response = session.get(&format!("/api/request/{}", id))?.send().await?;
            let request: TransportRequest = parse(response).await?;
            println!("{}", Table::new([request]));
        }
        RequestCommands::List => {
            let response = session.get("/api/request")?.send().await?;
            let requests: Vec<TransportRequest> = parse(response).await?;
            if requests.is_empty() {
                println!("No transport requests found");
            } else {
                println!("{}", Table::new(&requests));
            }
        }
    }
    Ok(())
}
