use clap::Subcommand;

use challonge::{Client, Config, IndexState, MatchFilter, MatchState, Tournament, TournamentFilter};

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// List your tournaments
    List {
        #[arg(long, value_enum)]
        state: Option<IndexState>,
    },
    /// Show one tournament by id or url
    Show { id: String },
    /// Create a tournament from a JSON object of fields
    Create { fields: String },
    /// Update a tournament from a JSON object of fields
    Update { id: String, fields: String },
    ProcessCheckIns { id: String },
    AbortCheckIn { id: String },
    Start { id: String },
    Finalize { id: String },
    Reset { id: String },
    Destroy { id: String },
    Participants { id: String },
    /// Add a participant by name
    AddParticipant { id: String, name: String },
    Matches {
        id: String,
        #[arg(long, value_enum)]
        state: Option<MatchState>,
    },
    /// Report game scores (`3-1 2-3 3-0`) for a match
    Report {
        id: String,
        match_id: u64,
        scores: Vec<String>,
    },
}

fn print_tournament(tournament: &Tournament) {
    let snapshot = tournament.snapshot();
    println!(
        " {} | {} | {} | {}",
        snapshot.get("id").cloned().unwrap_or_default(),
        tournament.name().unwrap_or("-"),
        snapshot
            .get("state")
            .and_then(|s| s.as_str())
            .unwrap_or("-"),
        snapshot
            .get("full_challonge_url")
            .and_then(|s| s.as_str())
            .unwrap_or("-"),
    );
}

impl Cmd {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::from_env()?;
        let client = Client::from_config(&config)?;

        match self {
            Cmd::List { state } => {
                let tournaments = client
                    .tournaments(&TournamentFilter {
                        state,
                        ..Default::default()
                    })
                    .await?;
                println!("Id | Name | State | Url");
                for tournament in &tournaments {
                    print_tournament(tournament);
                }
            }
            Cmd::Show { id } => {
                let tournament = client.tournament(&id).await?;
                println!("{}", serde_json::to_string_pretty(tournament.snapshot())?);
            }
            Cmd::Create { fields } => {
                let tournament = client
                    .create_tournament(&serde_json::from_str(&fields)?)
                    .await?;
                print_tournament(&tournament);
            }
            Cmd::Update { id, fields } => {
                let mut tournament = client.tournament(&id).await?;
                tournament.update(&serde_json::from_str(&fields)?).await?;
                print_tournament(&tournament);
            }
            Cmd::ProcessCheckIns { id } => {
                let mut tournament = client.tournament(&id).await?;
                tournament.process_check_ins().await?;
                print_tournament(&tournament);
            }
            Cmd::AbortCheckIn { id } => {
                let mut tournament = client.tournament(&id).await?;
                tournament.abort_check_in().await?;
                print_tournament(&tournament);
            }
            Cmd::Start { id } => {
                let mut tournament = client.tournament(&id).await?;
                tournament.start().await?;
                print_tournament(&tournament);
            }
            Cmd::Finalize { id } => {
                let mut tournament = client.tournament(&id).await?;
                tournament.finalize().await?;
                print_tournament(&tournament);
            }
            Cmd::Reset { id } => {
                let mut tournament = client.tournament(&id).await?;
                tournament.reset().await?;
                print_tournament(&tournament);
            }
            Cmd::Destroy { id } => {
                let mut tournament = client.tournament(&id).await?;
                tournament.destroy().await?;
                println!("deleted tournament {id}");
            }
            Cmd::Participants { id } => {
                let tournament = client.tournament(&id).await?;
                println!("Seed | Id | Name");
                for participant in tournament.participants().await? {
                    println!(
                        " {} | {} | {}",
                        participant.seed().unwrap_or_default(),
                        participant.id()?,
                        participant.name().unwrap_or("-")
                    );
                }
            }
            Cmd::AddParticipant { id, name } => {
                let tournament = client.tournament(&id).await?;
                let participant = tournament
                    .create_participant(&serde_json::json!({ "name": name }))
                    .await?;
                println!("added {} as {}", name, participant.id()?);
            }
            Cmd::Matches { id, state } => {
                let tournament = client.tournament(&id).await?;
                let filter = MatchFilter {
                    state,
                    ..Default::default()
                };
                println!("Id | Round | Player 1 | Player 2 | State | Scores");
                for game in tournament.matches(&filter).await? {
                    let snapshot = game.snapshot();
                    println!(
                        " {} | {} | {} | {} | {} | {}",
                        game.id()?,
                        snapshot.get("round").cloned().unwrap_or_default(),
                        snapshot.get("player1_id").cloned().unwrap_or_default(),
                        snapshot.get("player2_id").cloned().unwrap_or_default(),
                        game.state().unwrap_or("-"),
                        snapshot
                            .get("scores_csv")
                            .and_then(|s| s.as_str())
                            .unwrap_or(""),
                    );
                }
            }
            Cmd::Report {
                id,
                match_id,
                scores,
            } => {
                let tournament = client.tournament(&id).await?;
                let mut game = tournament.get_match(match_id).await?;
                game.update_scores(&scores).await?;
                println!(
                    "match {} winner: {}",
                    match_id,
                    game.snapshot().get("winner_id").cloned().unwrap_or_default()
                );
            }
        }

        Ok(())
    }
}
