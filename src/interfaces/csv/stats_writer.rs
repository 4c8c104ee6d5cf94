use crate::domain::redemption::CampaignStats;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct StatsRow {
    campaign: u64,
    total_amount: String,
    redemption_count: u64,
}

/// Writes campaign statistics as CSV: `campaign,total_amount,redemption_count`.
pub struct StatsWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StatsWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink),
        }
    }

    /// Writes the header followed by one row per campaign, then flushes.
    ///
    /// The header is written even when there are no rows.
    pub fn write_stats(&mut self, stats: impl IntoIterator<Item = CampaignStats>) -> Result<()> {
        self.writer
            .write_record(["campaign", "total_amount", "redemption_count"])?;
        for s in stats {
            self.writer.serialize(StatsRow {
                campaign: s.campaign_id.0,
                total_amount: s.total_amount.to_string(),
                redemption_count: s.redemption_count,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
