use serde::Deserialize;
use tabled::{Table, Tabled};

use super::{parse, Session};

#[derive(Debug, Deserialize, Tabled)]
struct Truck {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Capacity")]
    capacity: u32,
}

#[derive(Debug, Deserialize)]
struct TruckList {
    trucks: Vec<Truck>,
}

pub async fn execute(session: &Session) -> anyhow::Result<()> {
    let response = session.get("/api/find-truck")?.send().await?;
    let list: TruckList = parse(response).await?;
    if list.trucks.is_empty() {
        println!("No trucks available");
    } else {
        println!("{}", Table::new(&list.trucks));
    }
    Ok(())
}
