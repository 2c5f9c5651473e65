use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{info, warn};

pub const DBPEDIA_ENDPOINT: &str = "https://dbpedia.org/sparql";
pub const WIKIDATA_ENDPOINT: &str = "https://query.wikidata.org/sparql";

/// One result row: variable name to lexical value. Unbound variables are absent.
pub type Binding = HashMap<String, String>;

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

pub const TEAMS_QUERY: &str = r#"
PREFIX dbo: <http://dbpedia.org/ontology/>
PREFIX dbr: <http://dbpedia.org/resource/>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>

SELECT DISTINCT ?team ?teamName ?stadium ?founded WHERE {
  ?team dbo:league dbr:Premier_League .
  ?team rdfs:label ?teamName .
  OPTIONAL { ?team dbo:ground ?stadium . }
  OPTIONAL { ?team dbo:foundingDate ?founded . }
  FILTER (lang(?teamName) = 'en')
}
ORDER BY ?teamName
LIMIT 200
"#;

pub const MATCHES_QUERY: &str = r#"
PREFIX wd: <http://www.wikidata.org/entity/>
PREFIX wdt: <http://www.wikidata.org/prop/direct/>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>

SELECT ?match ?date ?homeTeamLabel ?awayTeamLabel ?homeGoals ?awayGoals
WHERE {
  VALUES ?season {
    wd:Q116198950
    wd:Q111963073
    wd:Q106624599
    wd:Q94051381
  }
  ?match wdt:P2453 ?season .
  ?match wdt:P6112 ?homeTeam ;
         wdt:P6113 ?awayTeam ;
         wdt:P585  ?date ;
         wdt:P1350 ?homeGoals ;
         wdt:P1351 ?awayGoals .
  ?homeTeam rdfs:label ?homeTeamLabel .
  ?awayTeam rdfs:label ?awayTeamLabel .
  FILTER (lang(?homeTeamLabel) = "en")
  FILTER (lang(?awayTeamLabel) = "en")
}
ORDER BY DESC(?date)
LIMIT 2000
"#;

pub const TEAM_STATS_QUERY: &str = r#"
PREFIX dbo: <http://dbpedia.org/ontology/>
PREFIX dbr: <http://dbpedia.org/resource/>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>

SELECT ?team ?teamName ?wins ?goalsFor WHERE {
  ?team dbo:league dbr:Premier_League .
  ?team rdfs:label ?teamName .
  OPTIONAL { ?team dbo:numberOfWins ?wins . }
  OPTIONAL { ?team dbo:numberOfGoals ?goalsFor . }
  FILTER (lang(?teamName) = 'en')
}
LIMIT 100
"#;

/// Decodes a SPARQL 1.1 JSON results document.
pub fn parse_bindings(body: &str) -> Result<Vec<Binding>> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("empty sparql response"));
    }
    let parsed: SparqlResponse =
        serde_json::from_str(trimmed).context("invalid sparql results json")?;
    Ok(parsed
        .results
        .bindings
        .into_iter()
        .map(|row| row.into_iter().map(|(k, term)| (k, term.value)).collect())
        .collect())
}

pub fn run_query(client: &Client, endpoint: &str, query: &str) -> Result<Vec<Binding>> {
    let resp = client
        .get(endpoint)
        .query(&[("query", query), ("format", "json")])
        .header(ACCEPT, "application/sparql-results+json")
        .send()
        .with_context(|| format!("sparql request to {endpoint} failed"))?;
    let status = resp.status();
    let body = resp.text().context("failed reading sparql body")?;
    if !status.is_success() {
        return Err(anyhow!("http {status} from {endpoint}"));
    }
    parse_bindings(&body)
}

/// Runs a query up to `attempts` times with a fixed pause. `None` when every
/// attempt failed.
pub fn run_query_with_retry(
    client: &Client,
    endpoint: &str,
    query: &str,
    description: &str,
    attempts: u32,
    pause: Duration,
) -> Option<Vec<Binding>> {
    info!(endpoint, "{description}");
    for attempt in 1..=attempts.max(1) {
        match run_query(client, endpoint, query) {
            Ok(rows) => return Some(rows),
            Err(err) => {
                warn!(attempt, attempts, error = %format!("{err:#}"), "{description} failed");
                if attempt < attempts {
                    thread::sleep(pause);
                }
            }
        }
    }
    warn!("giving up on {description}");
    None
}
