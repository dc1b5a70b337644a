//! Built-in MEO channel lineup.

use anyhow::Result;
use ptepg_core::{Horizon, RawBatch, RawChannel};
use tracing::instrument;

use crate::api::Collector;

/// Base URL of the MEO channel logos.
const ICON_BASE_URL: &str = "https://www.meo.pt/PublishingImages/";

/// One lineup entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CatalogEntry {
    service_id: &'static str,
    name: &'static str,
    number: u32,
    icon: &'static str,
}

const fn entry(
    service_id: &'static str,
    name: &'static str,
    number: u32,
    icon: &'static str,
) -> CatalogEntry {
    CatalogEntry {
        service_id,
        name,
        number,
        icon,
    }
}

/// MEO lineup, keyed by service id.
const CATALOG: &[CatalogEntry] = &[
    entry("RTP1", "RTP 1", 1, "rtp1.png"),
    entry("RTP2", "RTP 2", 2, "rtp2.png"),
    entry("SIC", "SIC", 15, "sic.png"),
    entry("TVI", "TVI", 16, "tvi.png"),
    entry("SICNOT", "SIC Notícias", 5, "sicnoticias.png"),
    entry("RTPNOT", "RTP Notícias", 6, "rtpnoticias.png"),
    entry("CNN", "CNN Portugal", 7, "cnn.png"),
    entry("TVICNN", "TVI Reality", 8, "tvireality.png"),
    entry("ARTP", "RTP Açores", 10, "rtpacores.png"),
    entry("MRTP", "RTP Madeira", 11, "rtpmadeira.png"),
    entry("RTPI", "RTP Internacional", 12, "rtpinternacional.png"),
    entry("RTP3", "RTP 3", 13, "rtp3.png"),
    entry("RTPMEM", "RTP Memória", 18, "rtpmemoria.png"),
    entry("TVIInt", "TVI Internacional", 20, "tviinternacional.png"),
    entry("ARTV", "ARTV", 30, "artv.png"),
    entry("PORTOCANAL", "Porto Canal", 35, "portocanal.png"),
    entry("EURON", "Euronews", 40, "euronews.png"),
    entry("CART", "Cartoon Network", 41, "cartoon.png"),
    entry("PANDA", "Canal Panda", 42, "canalpanda.png"),
    entry("DISNEY", "Disney Junior", 46, "disneyjunior.png"),
    entry("NICKJR", "Nick Jr.", 44, "nickjr.png"),
    entry("NICK", "Nickelodeon", 45, "nickelodeon.png"),
    entry("BABYTV", "Baby TV", 47, "babytv.png"),
    entry("JIMJAM", "Jim Jam", 48, "jimjam.png"),
    entry("BLAST", "BLAST", 49, "blast.png"),
    entry("SPORT", "Sport TV 1", 50, "sporttv1.png"),
    entry("SPORT2", "Sport TV 2", 51, "sporttv2.png"),
    entry("SPORT3", "Sport TV 3", 52, "sporttv3.png"),
    entry("SPORT4", "Sport TV 4", 53, "sporttv4.png"),
    entry("SPORT5", "Sport TV 5", 54, "sporttv5.png"),
    entry("SPORT6", "Sport TV 6", 55, "sporttv6.png"),
    entry("BENFICA", "Benfica TV", 56, "benficatv.png"),
    entry("SPORTING", "Sporting TV", 57, "sportingtv.png"),
    entry("ELEV", "Eleven Sports 1", 58, "eleven1.png"),
    entry("ELEV2", "Eleven Sports 2", 59, "eleven2.png"),
    entry("DAZN", "DAZN", 60, "dazn.png"),
    entry("HOLHD", "Hollywood", 61, "hollywood.png"),
    entry("FOXMOVHD", "FOX Movies", 62, "foxmovies.png"),
    entry("AMCHD", "AMC", 63, "amc.png"),
    entry("AXN", "AXN", 70, "axn.png"),
    entry("AXNW", "AXN White", 71, "axnwhite.png"),
    entry("AXNMOVIES", "AXN Movies", 72, "axnmovies.png"),
    entry("FOX", "FOX", 73, "fox.png"),
    entry("FOXLIFE", "FOX Life", 74, "foxlife.png"),
    entry("FOXCRIME", "FOX Crime", 75, "foxcrime.png"),
    entry("FOXCOMEDY", "FOX Comedy", 76, "foxcomedy.png"),
    entry("COSMO", "Cosmopolitan", 77, "cosmopolitan.png"),
    entry("E", "E! Entertainment", 78, "eentertainment.png"),
    entry("TVS", "TV Série", 79, "tvserie.png"),
    entry("CINEMUNDO", "Cinemundo", 80, "cinemundo.png"),
    entry("SYFY", "SyFy", 81, "syfy.png"),
    entry("DISC", "Discovery Channel", 90, "discovery.png"),
    entry("NATGEO", "National Geographic", 91, "natgeo.png"),
    entry("NATGEOWILD", "Nat Geo Wild", 92, "natgeowild.png"),
    entry("HIST", "History Channel", 93, "history.png"),
    entry("ODISSEIA", "Odisseia", 94, "odisseia.png"),
    entry("CACAV", "Caça e Pesca", 95, "cacaepesca.png"),
    entry("TRAV", "Travel Channel", 96, "travel.png"),
    entry("CRIME", "Crime + Investigation", 97, "crime.png"),
    entry("24KIT", "24 Kitchen", 100, "24kitchen.png"),
    entry("TVCINE1", "TVCine Top", 105, "tvcinetop.png"),
    entry("TVCINE2", "TVCine Edition", 106, "tvcineedition.png"),
    entry("TVCINE3", "TVCine Emotion", 107, "tvcineemotion.png"),
    entry("TVCINE4", "TVCine Action", 108, "tvcineaction.png"),
    entry("AMCBRE", "AMC Break", 109, "amcbreak.png"),
    entry("VH1", "VH1", 111, "vh1.png"),
    entry("MTV", "MTV Portugal", 112, "mtv.png"),
    entry("MCM", "MCM Pop", 113, "mcm.png"),
    entry("AFROMU", "Afro Music", 114, "afromusic.png"),
    entry("MEZZO", "Mezzo", 115, "mezzo.png"),
    entry("FUEL", "Fuel TV", 120, "fueltv.png"),
    entry("MOTORS", "Motors TV", 121, "motorstv.png"),
    entry("CASACOZ", "Casa e Cozinha", 122, "casaecozinha.png"),
    entry("FASHIONTV", "Fashion TV", 123, "fashiontv.png"),
    entry("LUXE", "Luxe TV", 124, "luxetv.png"),
    entry("TOROS", "Toros TV", 125, "torostv.png"),
    entry("FINE", "Fine Living", 126, "fineliving.png"),
];

/// Collector for the built-in MEO lineup.
///
/// Produces channels only. With no schedule data, every channel gets a
/// placeholder program for each day of the horizon.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeoCatalog;

impl MeoCatalog {
    /// Creates the catalog collector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Number of channels in the lineup.
    #[must_use]
    pub const fn len(&self) -> usize {
        CATALOG.len()
    }

    /// Whether the lineup is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        CATALOG.is_empty()
    }

    fn channels() -> Vec<RawChannel> {
        CATALOG
            .iter()
            .map(|entry| RawChannel {
                channel_id: None,
                service_id: Some(String::from(entry.service_id)),
                name: Some(String::from(entry.name)),
                number: Some(entry.number),
                icon: Some(format!("{ICON_BASE_URL}{}", entry.icon)),
            })
            .collect()
    }
}

impl Collector for MeoCatalog {
    fn name(&self) -> &str {
        "meo-catalog"
    }

    #[instrument(skip_all)]
    async fn collect(&self, horizon: &Horizon) -> Result<RawBatch> {
        let channels = Self::channels();
        tracing::debug!(
            channels = channels.len(),
            days = horizon.days(),
            "loaded MEO channel catalog"
        );
        Ok(RawBatch {
            channels,
            ..RawBatch::default()
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashSet;

    use chrono::NaiveDate;
    use ptepg_core::{NormalizeOptions, normalize};
    use url::Url;

    use super::*;

    fn horizon() -> Horizon {
        Horizon::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 1)
    }

    #[test]
    fn test_catalog_service_ids_are_unique() {
        // Arrange & Act
        let ids: HashSet<&str> = CATALOG.iter().map(|e| e.service_id).collect();

        // Assert
        assert_eq!(ids.len(), CATALOG.len());
        assert_eq!(MeoCatalog::new().len(), 77);
    }

    #[test]
    fn test_catalog_numbers_are_unique_and_positive() {
        // Arrange & Act
        let numbers: HashSet<u32> = CATALOG.iter().map(|e| e.number).collect();

        // Assert
        assert_eq!(numbers.len(), CATALOG.len());
        assert!(!numbers.contains(&0));
    }

    #[tokio::test]
    async fn test_collect_returns_channels_only() {
        // Arrange
        let catalog = MeoCatalog::new();

        // Act
        let batch = catalog.collect(&horizon()).await.unwrap();

        // Assert
        assert!(batch.programs.is_empty());
        let rtp1 = batch
            .channels
            .iter()
            .find(|c| c.service_id.as_deref() == Some("RTP1"))
            .unwrap();
        assert_eq!(rtp1.name.as_deref(), Some("RTP 1"));
        assert_eq!(rtp1.number, Some(1));
        assert_eq!(
            rtp1.icon.as_deref(),
            Some("https://www.meo.pt/PublishingImages/rtp1.png")
        );
    }

    #[tokio::test]
    async fn test_catalog_normalizes_to_placeholder_guide() {
        // Arrange
        let batch = MeoCatalog::new().collect(&horizon()).await.unwrap();
        let options = NormalizeOptions::new(
            horizon(),
            Url::parse("https://www.meo.pt/favicon.ico").unwrap(),
        );

        // Act
        let (guide, report) = normalize(&[batch], &options).unwrap();

        // Assert
        assert_eq!(guide.channels.len(), 77);
        assert_eq!(report.placeholders, 77);
        assert_eq!(report.total_skipped(), 0);
        assert_eq!(guide.channels.first().unwrap().id, "RTP1");
        assert_eq!(guide.channels.last().unwrap().id, "FINE");
    }
}
