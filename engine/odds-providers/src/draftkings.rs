//! DraftKings sportsbook provider

use crate::config::DraftKingsConfig;
use crate::error::ProviderError;
use crate::models::{FetchResult, MarketQuote, NormalizedGame};
use crate::provider::OddsProvider;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub const PROVIDER_NAME: &str = "draftkings";

/// Prefix applied to event ids so they never collide with another book's ids
pub const EXTERNAL_ID_PREFIX: &str = "dk_";

/// Markets kept from a league response
const MAIN_MARKETS: &[&str] = &["Moneyline", "Spread", "Total"];

const USER_AGENT: &str = "Mozilla/5.0 (compatible; BettingAggregator/1.0)";

/// League response as served by the sportscontent API
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LeagueResponse {
    pub events: Vec<Event>,
    pub markets: Vec<Market>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Event {
    pub id: Value,
    pub name: String,
    pub start_event_date: Option<String>,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    pub venue_role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Market {
    pub id: Value,
    pub event_id: Value,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Selection {
    pub market_id: Value,
    pub label: String,
    pub display_odds: Option<DisplayOdds>,
    pub true_odds: Option<f64>,
    pub points: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DisplayOdds {
    pub american: Option<String>,
    pub decimal: Option<String>,
}

/// Fetches league odds from the DraftKings sportsbook API
pub struct DraftKingsProvider {
    client: Client,
    config: DraftKingsConfig,
}

impl DraftKingsProvider {
    pub fn new(config: DraftKingsConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout()).user_agent(USER_AGENT).build()?;

        Ok(Self { client, config })
    }

    /// DraftKings league id for a canonical sport
    fn league_for(&self, sport: &str) -> Option<&str> {
        self.config
            .leagues
            .iter()
            .find(|(_, canonical)| canonical.as_str() == sport)
            .map(|(league_id, _)| league_id.as_str())
    }

    async fn fetch_league(&self, league_id: &str) -> Result<LeagueResponse, ProviderError> {
        let url = self.config.league_url(league_id);
        info!("Fetching DraftKings data from: {}", url);

        let response = self.client.get(&url).header("Accept", "*/*").send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let league: LeagueResponse = serde_json::from_str(&body)?;
        info!("Successfully fetched {} events from DraftKings", league.events.len());

        Ok(league)
    }
}

#[async_trait::async_trait]
impl OddsProvider for DraftKingsProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn sports_mapping(&self) -> HashMap<String, String> {
        self.config.leagues.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    async fn fetch_odds(&self, sport: &str) -> FetchResult {
        let league_id =
            self.league_for(sport).ok_or_else(|| ProviderError::UnsupportedSport(sport.to_string()))?;

        let league = self.fetch_league(league_id).await?;
        Ok(parse_league(sport, &league))
    }
}

/// Normalize a league response into games carrying their main-market quotes.
///
/// Events missing either team are skipped. Selections whose odds cannot be
/// read are dropped individually.
pub fn parse_league(sport: &str, league: &LeagueResponse) -> Vec<NormalizedGame> {
    let markets: HashMap<String, &Market> = league
        .markets
        .iter()
        .filter(|m| MAIN_MARKETS.contains(&m.name.as_str()))
        .filter_map(|m| id_string(&m.id).map(|id| (id, m)))
        .collect();

    let mut quotes_by_event: HashMap<String, Vec<MarketQuote>> = HashMap::new();
    for selection in &league.selections {
        let Some(market) = id_string(&selection.market_id).and_then(|id| markets.get(&id)) else {
            continue;
        };
        let Some(event_id) = id_string(&market.event_id) else {
            continue;
        };
        let Some(odds) = selection_odds(selection) else {
            debug!("Dropping selection {} in {}: no readable odds", selection.label, market.name);
            continue;
        };

        quotes_by_event.entry(event_id).or_default().push(MarketQuote::new(
            market.name.clone(),
            selection_label(selection),
            odds,
        ));
    }

    let mut games = Vec::new();
    for event in &league.events {
        let Some(event_id) = id_string(&event.id) else {
            continue;
        };

        let home = participant(event, "home");
        let away = participant(event, "away");
        let (Some(home_team), Some(away_team)) = (home, away) else {
            warn!("Skipping event {}: missing team info", event_id);
            continue;
        };

        let mut game = NormalizedGame::new(
            sport,
            format!("{}{}", EXTERNAL_ID_PREFIX, event_id),
            home_team,
            away_team,
        );
        game.start_time = event.start_event_date.as_deref().and_then(parse_start_time);
        game.quotes = quotes_by_event.remove(&event_id).unwrap_or_default();

        games.push(game);
    }

    info!("Successfully parsed {} games from DraftKings", games.len());
    games
}

/// Ids arrive as strings or numbers depending on the endpoint
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn participant<'a>(event: &'a Event, role: &str) -> Option<&'a str> {
    event
        .participants
        .iter()
        .find(|p| p.venue_role.eq_ignore_ascii_case(role) && !p.name.trim().is_empty())
        .map(|p| p.name.as_str())
}

fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            warn!("Failed to parse datetime {}: {}", raw, e);
            None
        }
    }
}

fn selection_label(selection: &Selection) -> String {
    match selection.points {
        Some(points) => format!("{} ({})", selection.label, points),
        None => selection.label.clone(),
    }
}

/// Decimal odds, preferring the unrounded price
fn selection_odds(selection: &Selection) -> Option<f64> {
    if let Some(odds) = selection.true_odds.filter(|o| is_valid_price(*o)) {
        return Some(odds);
    }

    let display = selection.display_odds.as_ref()?;
    let decimal = display.decimal.as_deref().and_then(|d| d.trim().parse::<f64>().ok()).filter(|o| is_valid_price(*o));
    if decimal.is_some() {
        return decimal;
    }

    display.american.as_deref().and_then(parse_american).map(american_to_decimal).filter(|o| is_valid_price(*o))
}

/// A decimal price must pay back more than the stake
fn is_valid_price(odds: f64) -> bool {
    odds.is_finite() && odds > 1.0
}

/// Parse an American price, accepting the typographic minus sign
fn parse_american(raw: &str) -> Option<i32> {
    raw.trim().replace('\u{2212}', "-").trim_start_matches('+').parse::<i32>().ok().filter(|v| *v != 0)
}

pub fn american_to_decimal(american: i32) -> f64 {
    if american > 0 {
        1.0 + american as f64 / 100.0
    } else {
        1.0 + 100.0 / -(american as f64)
    }
}
