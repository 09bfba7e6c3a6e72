use crate::api::{open_sheet, Mode, Sheet};
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{Column, Mapping, Record};
use crate::{Config, Result};
use anyhow::{bail, Context};
use std::fmt::{Debug, Formatter};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A connection to the one worksheet this program reads and writes. It is created once and shared.
pub struct StoreClient {
    worksheet: String,
    inner: Mutex<Inner>,
}

struct Inner {
    sheet: Box<dyn Sheet + Send>,
    /// The header row as last seen. `None` until it has been read.
    mapping: Option<Mapping>,
}

impl Debug for StoreClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("worksheet", &self.worksheet)
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    /// Authenticates and opens the configured worksheet, or the first worksheet if none is
    /// configured. Any failure is a `Connection` error.
    pub async fn connect(config: &Config, mode: Mode) -> Result<Self> {
        Self::connect_inner(config, mode)
            .await
            .pub_result(ErrorType::Connection)
    }

    async fn connect_inner(config: &Config, mode: Mode) -> Res<Self> {
        let mut sheet = open_sheet(config, mode)
            .await
            .with_context(|| format!("Unable to connect to {}", config.spreadsheet()))?;
        let worksheets = sheet.worksheets().await?;
        let worksheet = match config.worksheet() {
            Some(wanted) => {
                if !worksheets.iter().any(|w| w == wanted) {
                    bail!(
                        "The worksheet '{wanted}' does not exist in {}, found: {}",
                        config.spreadsheet(),
                        worksheets.join(", ")
                    )
                }
                wanted.to_string()
            }
            None => worksheets
                .into_iter()
                .next()
                .with_context(|| format!("{} has no worksheets", config.spreadsheet()))?,
        };
        info!("Connected to worksheet '{worksheet}'");
        Ok(Self {
            worksheet,
            inner: Mutex::new(Inner {
                sheet,
                mapping: None,
            }),
        })
    }

    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    /// Downloads every row of the worksheet, including the header row.
    pub(crate) async fn fetch_rows(&self) -> Res<Vec<Vec<String>>> {
        let mut inner = self.inner.lock().await;
        let rows = inner.sheet.get(&self.worksheet).await?;
        // A header that does not parse is re-read, and reported, by the next append.
        inner.mapping = rows
            .first()
            .and_then(|header| Mapping::new(header.clone()).ok());
        debug!("Fetched {} rows from '{}'", rows.len(), self.worksheet);
        Ok(rows)
    }

    /// Appends `record` as a row laid out by the worksheet's header. If the worksheet is still
    /// empty, the default header row goes in first.
    pub(crate) async fn append_record(&self, record: &Record) -> Res<()> {
        let mut inner = self.inner.lock().await;
        let mapping = match inner.mapping.take() {
            Some(mapping) => mapping,
            None => self.read_or_write_header(&mut inner).await?,
        };
        let row = record.to_row(&mapping);
        inner.mapping = Some(mapping);
        let row = row.with_context(|| {
            format!("Unable to lay out a row for worksheet '{}'", self.worksheet)
        })?;
        inner.sheet.append_row(&self.worksheet, &row).await
    }

    async fn read_or_write_header(&self, inner: &mut Inner) -> Res<Mapping> {
        let header = inner.sheet.header(&self.worksheet).await?;
        if !header.is_empty() {
            return Mapping::new(header).with_context(|| {
                format!("The header row of worksheet '{}' is invalid", self.worksheet)
            });
        }
        debug!("Writing the header row to empty worksheet '{}'", self.worksheet);
        let header: Vec<serde_json::Value> =
            Column::headers().into_iter().map(Into::into).collect();
        inner
            .sheet
            .append_row(&self.worksheet, &header)
            .await
            .context("Unable to write the header row")?;
        Mapping::new(Column::headers())
    }
}
