//! GitHub profile counters and contribution calendar over GraphQL.

use serde::Deserialize;
use serde_json::json;

use super::{ProviderError, fetch_json};

pub const GRAPHQL_URL: &str = "https://api.github.com/graphql";

const QUERY: &str = r#"
query($username: String!) {
  user(login: $username) {
    login
    followers { totalCount }
    repositories(first: 100, ownerAffiliations: OWNER, privacy: PUBLIC) {
      nodes { stargazerCount }
    }
    contributionsCollection {
      contributionCalendar {
        totalContributions
        weeks { contributionDays { date contributionCount } }
      }
    }
  }
}
"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubUser {
    pub login: String,
    #[serde(default)]
    pub followers: Count,
    #[serde(default)]
    pub repositories: Repositories,
    #[serde(default)]
    pub contributions_collection: ContributionsCollection,
}

impl GithubUser {
    pub fn total_stars(&self) -> i64 {
        self.repositories.nodes.iter().map(|r| r.stargazer_count).sum()
    }

    pub fn weeks(&self) -> &[Week] {
        &self.contributions_collection.contribution_calendar.weeks
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Count {
    pub total_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Repositories {
    #[serde(default)]
    pub nodes: Vec<Repository>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    #[serde(default)]
    pub stargazer_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionsCollection {
    #[serde(default)]
    pub contribution_calendar: ContributionCalendar,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionCalendar {
    #[serde(default)]
    pub total_contributions: i64,
    #[serde(default)]
    pub weeks: Vec<Week>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    #[serde(default)]
    pub contribution_days: Vec<ContributionDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionDay {
    pub date: String,
    pub contribution_count: i64,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<GraphqlData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlData {
    user: Option<GithubUser>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

impl GraphqlResponse {
    fn into_user(self) -> Result<GithubUser, ProviderError> {
        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(ProviderError::Unavailable(format!("GraphQL error: {}", messages.join("; "))));
        }
        self.data
            .and_then(|d| d.user)
            .ok_or_else(|| ProviderError::Unavailable("GraphQL response has no user".to_string()))
    }
}

/// Fetch a user's followers, starred repositories and contribution calendar.
pub async fn fetch_user(
    client: &reqwest::Client,
    url: &str,
    username: &str,
    token: &str,
) -> Result<GithubUser, ProviderError> {
    let body = json!({ "query": QUERY, "variables": { "username": username } });
    let request = client.post(url).bearer_auth(token).json(&body);
    let response: GraphqlResponse = fetch_json(request).await?;
    response.into_user()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_user() {
        let json = r#"{"data": {"user": {
            "login": "octocat",
            "followers": {"totalCount": 1234},
            "repositories": {"nodes": [{"stargazerCount": 10}, {"stargazerCount": 5}]},
            "contributionsCollection": {"contributionCalendar": {
                "totalContributions": 3,
                "weeks": [{"contributionDays": [
                    {"date": "2024-01-01", "contributionCount": 1},
                    {"date": "2024-01-02", "contributionCount": 2}
                ]}]
            }}
        }}}"#;
        let user = serde_json::from_str::<GraphqlResponse>(json).unwrap().into_user().unwrap();
        assert_eq!(user.login, "octocat");
        assert_eq!(user.followers.total_count, 1234);
        assert_eq!(user.total_stars(), 15);
        assert_eq!(user.weeks()[0].contribution_days[1].contribution_count, 2);
    }

    #[test]
    fn test_graphql_errors_are_unavailable() {
        let json = r#"{"data": {"user": null}, "errors": [{"message": "Could not resolve to a User"}]}"#;
        let err = serde_json::from_str::<GraphqlResponse>(json).unwrap().into_user().unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(m) if m.contains("Could not resolve")));
    }

    #[test]
    fn test_missing_user_is_unavailable() {
        let err = serde_json::from_str::<GraphqlResponse>(r#"{"data": {"user": null}}"#)
            .unwrap()
            .into_user()
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }
}
