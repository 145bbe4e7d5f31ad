use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::{debug, info};

use super::error::{MongoDaoError, MongoResult};

/// Pings sent before giving up on a freshly built client.
const READY_PINGS: u32 = 10;
const FIRST_PING_DELAY: Duration = Duration::from_millis(250);
const MAX_PING_DELAY: Duration = Duration::from_secs(5);

/// Open the database holding the `identities` and `teams` collections.
///
/// Returns once the server answers a ping, or fails after [`READY_PINGS`]
/// unanswered pings.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    wait_until_ready(&database).await?;
    info!(database = database_name, "bot database reachable");
    Ok((client, database))
}

async fn wait_until_ready(database: &Database) -> MongoResult<()> {
    let mut delays = ping_delays();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let Err(source) = database.run_command(doc! { "ping": 1 }).await else {
            return Ok(());
        };
        match delays.next() {
            Some(delay) => {
                debug!(attempts, error = %source, "bot database not ready; pinging again");
                sleep(delay).await;
            }
            None => return Err(MongoDaoError::InitialPing { attempts, source }),
        }
    }
}

/// Pauses between pings: doubling from [`FIRST_PING_DELAY`], capped at
/// [`MAX_PING_DELAY`], one fewer than [`READY_PINGS`].
fn ping_delays() -> impl Iterator<Item = Duration> {
    std::iter::successors(Some(FIRST_PING_DELAY), |delay| {
        Some((*delay * 2).min(MAX_PING_DELAY))
    })
    .take(READY_PINGS as usize - 1)
}
