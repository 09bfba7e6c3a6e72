//! Implements the `Sheet` trait using the `sheets::Client` (reads) and plain `reqwest` calls
//! (Drive search, appends) to interact with a Google sheet.

use crate::api::{quote_worksheet, Sheet, TokenProvider};
use crate::config::SpreadsheetRef;
use crate::error::Res;
use anyhow::{bail, Context};
use serde::Deserialize;
use sheets::types::{DateTimeRenderOption, Dimension, ValueRenderOption};
use sheets::ClientError;
use tracing::{debug, trace};
use url::Url;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Implements the `Sheet` trait against Google Sheets. It takes a `TokenProvider`, on which it
/// calls refresh to keep the token up-to-date.
pub(crate) struct GoogleSheet {
    spreadsheet_id: String,
    token_provider: TokenProvider,
    client: sheets::Client,
    http: reqwest::Client,
}

impl GoogleSheet {
    /// Authenticates and resolves `spreadsheet` to a spreadsheet ID.
    pub(crate) async fn new(
        spreadsheet: &SpreadsheetRef,
        mut token_provider: TokenProvider,
    ) -> Res<Self> {
        let client = create_sheets_client(&mut token_provider).await?;
        let http = reqwest::Client::new();
        let spreadsheet_id = match spreadsheet {
            SpreadsheetRef::Id(id) => id.clone(),
            SpreadsheetRef::Title(title) => {
                let token = token_provider.token_with_refresh().await?.to_string();
                find_spreadsheet_by_title(&http, &token, title).await?
            }
        };
        debug!(
            "Using spreadsheet {spreadsheet_id} as {}",
            token_provider.key().client_email()
        );
        Ok(Self {
            spreadsheet_id,
            token_provider,
            client,
            http,
        })
    }

    /// Refreshes the sheets client with a new access token if needed
    async fn refresh_client(&mut self) -> Res<()> {
        self.client = create_sheets_client(&mut self.token_provider).await?;
        Ok(())
    }

    async fn values_get(&mut self, range: &str) -> Res<Vec<Vec<String>>> {
        self.refresh_client().await?;
        let response = self
            .client
            .spreadsheets()
            .values_get(
                &self.spreadsheet_id,
                range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch {range}"))?;
        Ok(response.body.values)
    }
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn worksheets(&mut self) -> Res<Vec<String>> {
        trace!("worksheets");
        self.refresh_client().await?;
        let response = self
            .client
            .spreadsheets()
            .get(&self.spreadsheet_id, false, &[])
            .await
            .map_err(map_client_error)
            .context("Failed to fetch the spreadsheet properties")?;
        Ok(response
            .body
            .sheets
            .into_iter()
            .filter_map(|sheet| sheet.properties)
            .map(|properties| properties.title)
            .collect())
    }

    async fn header(&mut self, worksheet: &str) -> Res<Vec<String>> {
        trace!("header for {worksheet}");
        let range = format!("{}!1:1", quote_worksheet(worksheet));
        Ok(self.values_get(&range).await?.into_iter().next().unwrap_or_default())
    }

    async fn get(&mut self, worksheet: &str) -> Res<Vec<Vec<String>>> {
        trace!("get for {worksheet}");
        let range = format!("{}!A:ZZ", quote_worksheet(worksheet)); // Get all columns
        self.values_get(&range).await
    }

    async fn append_row(&mut self, worksheet: &str, row: &[serde_json::Value]) -> Res<()> {
        trace!("append_row for {worksheet}");
        // POST .../spreadsheets/{id}/values/{range}:append
        let range = format!("{}!A1", quote_worksheet(worksheet));
        let mut url = Url::parse(SHEETS_API)?;
        push_segment(&mut url, &self.spreadsheet_id)?;
        push_segment(&mut url, "values")?;
        push_segment(&mut url, &format!("{range}:append"))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let token = self.token_provider.token_with_refresh().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": [row],
            }))
            .send()
            .await
            .context("Failed to send the append request to the Google Sheets API")?;
        let _: serde_json::Value = parse_response(response, "append").await?;
        Ok(())
    }
}

/// Searches Drive for a spreadsheet named `title`. The first match wins.
async fn find_spreadsheet_by_title(
    http: &reqwest::Client,
    token: &str,
    title: &str,
) -> Res<String> {
    let query = format!(
        "name = '{}' and mimeType = '{SPREADSHEET_MIME_TYPE}' and trashed = false",
        title.replace('\\', "\\\\").replace('\'', "\\'")
    );
    let mut url = Url::parse(DRIVE_FILES_API)?;
    url.query_pairs_mut()
        .append_pair("q", &query)
        .append_pair("fields", "files(id)")
        .append_pair("pageSize", "1");

    let response = http
        .get(url)
        .bearer_auth(token)
        .send()
        .await
        .context("Failed to send the search request to the Google Drive API")?;
    let list: FileList = parse_response(response, "Drive search").await?;
    match list.files.into_iter().next() {
        Some(file) => Ok(file.id),
        None => bail!("No spreadsheet named '{title}' is shared with the service account"),
    }
}

fn push_segment(url: &mut Url, segment: &str) -> Res<()> {
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Cannot add path segments to {SHEETS_API}"))?
        .push(segment);
    Ok(())
}

async fn parse_response<T>(response: reqwest::Response, what: &str) -> Res<T>
where
    T: serde::de::DeserializeOwned,
{
    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        bail!("The {what} request failed with status {status}: {body}");
    }
    response
        .json()
        .await
        .with_context(|| format!("Failed to parse the {what} response"))
}

/// Creates a new sheets client with a refreshed access token.
async fn create_sheets_client(token_provider: &mut TokenProvider) -> Res<sheets::Client> {
    let access_token = token_provider.token_with_refresh().await?;

    // The sheets crate wants OAuth client details that a service account does not have; only the
    // access token is used for API calls.
    Ok(sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token.to_string(),
        String::new(),
    ))
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}
