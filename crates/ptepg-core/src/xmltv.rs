//! XMLTV serializer.
//!
//! Output is a pure function of the [`Guide`] and [`GeneratorInfo`]: the
//! same input always produces the same bytes.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::instrument;

use crate::model::{Channel, Guide, Program, schedule_cmp};
use crate::normalize::text::is_xml_char;

/// Programme timestamp layout. Instants are always written in UTC.
const TIME_FORMAT: &str = "%Y%m%d%H%M%S +0000";

/// Identification written on the root `tv` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorInfo {
    /// `generator-info-name`.
    pub name: String,
    /// `generator-info-url`.
    pub url: String,
    /// `lang` attribute of text elements; `None` omits it.
    pub language: Option<String>,
}

impl Default for GeneratorInfo {
    fn default() -> Self {
        Self {
            name: String::from("MEO EPG Generator"),
            url: String::from("https://github.com/pereiraru/meo-epg-generator"),
            language: Some(String::from("pt")),
        }
    }
}

/// Renders the guide as an XMLTV document.
///
/// # Errors
///
/// Returns an error if the XML writer fails.
#[instrument(skip_all, fields(channels = guide.channels.len(), programs = guide.programs.len()))]
pub fn render(guide: &Guide, info: &GeneratorInfo) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let lang = info.language.as_deref().filter(|l| !l.trim().is_empty());

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut tv = BytesStart::new("tv");
    tv.push_attribute(("generator-info-name", info.name.as_str()));
    tv.push_attribute(("generator-info-url", info.url.as_str()));
    writer.write_event(Event::Start(tv))?;

    let mut channels: Vec<&Channel> = guide.channels.iter().collect();
    channels.sort_by(|a, b| a.display_cmp(b));
    for channel in channels {
        write_channel(&mut writer, channel, lang)?;
    }

    let mut programs: Vec<&Program> = guide
        .programs
        .iter()
        .filter(|program| {
            let known = guide.channel(&program.channel_id).is_some();
            if !known {
                tracing::debug!(channel = %program.channel_id, title = %program.title, "dropping programme for unknown channel");
            }
            known
        })
        .collect();
    programs.sort_by(|a, b| schedule_cmp(a, b));
    for program in programs {
        write_programme(&mut writer, program, lang)?;
    }

    writer.write_event(Event::End(BytesEnd::new("tv")))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

/// Renders the guide and writes it to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if rendering fails or the file cannot be written.
pub fn write_guide(path: &Path, guide: &Guide, info: &GeneratorInfo) -> Result<()> {
    let bytes = render(guide, info)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "guide written");
    Ok(())
}

fn write_channel<W: Write>(
    writer: &mut Writer<W>,
    channel: &Channel,
    lang: Option<&str>,
) -> Result<()> {
    let mut start = BytesStart::new("channel");
    start.push_attribute(("id", sanitize_text(&channel.id).as_str()));
    writer.write_event(Event::Start(start))?;

    write_text_element(writer, "display-name", &channel.display_name, lang)?;
    if let Some(number) = channel.number {
        write_text_element(writer, "display-name", &number.to_string(), lang)?;
    }

    let mut icon = BytesStart::new("icon");
    icon.push_attribute(("src", channel.icon.as_str()));
    writer.write_event(Event::Empty(icon))?;

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    Ok(())
}

fn write_programme<W: Write>(
    writer: &mut Writer<W>,
    program: &Program,
    lang: Option<&str>,
) -> Result<()> {
    let mut start = BytesStart::new("programme");
    start.push_attribute(("start", format_time(program.start).as_str()));
    start.push_attribute(("stop", format_time(program.stop).as_str()));
    start.push_attribute(("channel", sanitize_text(&program.channel_id).as_str()));
    writer.write_event(Event::Start(start))?;

    write_text_element(writer, "title", &program.title, lang)?;
    if let Some(subtitle) = present(program.subtitle.as_deref()) {
        write_text_element(writer, "sub-title", subtitle, lang)?;
    }
    if let Some(description) = present(program.description.as_deref()) {
        write_text_element(writer, "desc", description, lang)?;
    }
    if let Some(genre) = present(program.genre.as_deref()) {
        write_text_element(writer, "category", genre, lang)?;
    }
    if let Some(year) = present(program.release_year.as_deref()) {
        write_text_element(writer, "date", year, None)?;
    }
    if let Some(episode) = program.episode {
        let mut start = BytesStart::new("episode-num");
        start.push_attribute(("system", "xmltv_ns"));
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Text(BytesText::new(&episode.to_xmltv_ns())))?;
        writer.write_event(Event::End(BytesEnd::new("episode-num")))?;
    }
    if let Some(rating) = present(program.rating.as_deref()) {
        writer.write_event(Event::Start(BytesStart::new("rating")))?;
        write_text_element(writer, "value", rating, None)?;
        writer.write_event(Event::End(BytesEnd::new("rating")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("programme")))?;
    Ok(())
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
    lang: Option<&str>,
) -> Result<()> {
    let mut start = BytesStart::new(name);
    if let Some(lang) = lang {
        start.push_attribute(("lang", lang));
    }
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(&sanitize_text(text))))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Strips control characters that XML 1.0 does not allow.
fn sanitize_text(input: &str) -> String {
    input
        .chars()
        .filter(|&c| is_xml_char(c))
        .collect()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn format_time(instant: DateTime<Utc>) -> String {
    instant.format(TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::num::NonZeroU32;

    use chrono::TimeZone;
    use url::Url;

    use super::*;
    use crate::model::EpisodeNumber;

    fn channel(id: &str, name: &str, number: u32) -> Channel {
        Channel {
            id: String::from(id),
            display_name: String::from(name),
            number: NonZeroU32::new(number),
            icon: Url::parse("https://example.org/logo.png").unwrap(),
        }
    }

    fn program(channel_id: &str, hour: u32, title: &str) -> Program {
        Program {
            channel_id: String::from(channel_id),
            start: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
            stop: Utc.with_ymd_and_hms(2024, 5, 1, hour, 30, 0).unwrap(),
            title: String::from(title),
            subtitle: None,
            description: None,
            genre: None,
            release_year: None,
            rating: None,
            episode: None,
            placeholder: false,
        }
    }

    fn render_string(guide: &Guide) -> String {
        String::from_utf8(render(guide, &GeneratorInfo::default()).unwrap()).unwrap()
    }

    #[test]
    fn test_render_document_header() {
        // Arrange
        let guide = Guide::default();

        // Act
        let xml = render_string(&guide);

        // Assert
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(
            r#"<tv generator-info-name="MEO EPG Generator" generator-info-url="https://github.com/pereiraru/meo-epg-generator">"#
        ));
        assert!(xml.trim_end().ends_with("</tv>"));
    }

    #[test]
    fn test_render_channel() {
        // Arrange
        let guide = Guide {
            channels: vec![channel("RTP1", "RTP 1", 1), channel("ARTV", "ARTV", 0)],
            programs: Vec::new(),
        };

        // Act
        let xml = render_string(&guide);

        // Assert
        assert!(xml.contains(r#"<channel id="RTP1">"#));
        assert!(xml.contains(r#"<display-name lang="pt">RTP 1</display-name>"#));
        assert!(xml.contains(r#"<display-name lang="pt">1</display-name>"#));
        assert!(xml.contains(r#"<icon src="https://example.org/logo.png"/>"#));
        assert!(!xml.contains(">0</display-name>"));
        assert!(xml.find(r#"id="RTP1""#).unwrap() < xml.find(r#"id="ARTV""#).unwrap());
    }

    #[test]
    fn test_render_programme_with_all_fields() {
        // Arrange
        let mut full = program("RTP1", 20, "Anatomia de Grey");
        full.subtitle = Some(String::from("O Regresso"));
        full.description = Some(String::from("Meredith volta ao hospital."));
        full.genre = Some(String::from("Série"));
        full.release_year = Some(String::from("2019"));
        full.rating = Some(String::from("M/12"));
        full.episode = EpisodeNumber::new(3, 12);
        let guide = Guide {
            channels: vec![channel("RTP1", "RTP 1", 1)],
            programs: vec![full],
        };

        // Act
        let xml = render_string(&guide);

        // Assert
        assert!(xml.contains(
            r#"<programme start="20240501200000 +0000" stop="20240501203000 +0000" channel="RTP1">"#
        ));
        let order = [
            r#"<title lang="pt">Anatomia de Grey</title>"#,
            r#"<sub-title lang="pt">O Regresso</sub-title>"#,
            r#"<desc lang="pt">Meredith volta ao hospital.</desc>"#,
            r#"<category lang="pt">Série</category>"#,
            "<date>2019</date>",
            r#"<episode-num system="xmltv_ns">2.11.</episode-num>"#,
            "<value>M/12</value>",
        ];
        let positions: Vec<usize> = order.iter().map(|s| xml.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_render_omits_absent_and_empty_fields() {
        // Arrange
        let mut sparse = program("RTP1", 20, "Telejornal");
        sparse.description = Some(String::new());
        let guide = Guide {
            channels: vec![channel("RTP1", "RTP 1", 1)],
            programs: vec![sparse],
        };

        // Act
        let xml = render_string(&guide);

        // Assert
        assert!(xml.contains(r#"<title lang="pt">Telejornal</title>"#));
        for tag in ["<desc", "<sub-title", "<category", "<date", "<episode-num", "<rating"] {
            assert!(!xml.contains(tag), "unexpected {tag}");
        }
    }

    #[test]
    fn test_render_first_episode_is_zero_based() {
        // Arrange
        let mut first = program("RTP1", 20, "Série");
        first.episode = EpisodeNumber::new(1, 1);
        let guide = Guide {
            channels: vec![channel("RTP1", "RTP 1", 1)],
            programs: vec![first],
        };

        // Act
        let xml = render_string(&guide);

        // Assert
        assert!(xml.contains(r#"<episode-num system="xmltv_ns">0.0.</episode-num>"#));
    }

    #[test]
    fn test_render_escapes_text() {
        // Arrange
        let guide = Guide {
            channels: vec![channel("RTP1", "RTP 1", 1)],
            programs: vec![program("RTP1", 20, "Tom & Jerry <HD>\u{7}")],
        };

        // Act
        let xml = render_string(&guide);

        // Assert
        assert!(xml.contains("Tom &amp; Jerry &lt;HD&gt;</title>"));
    }

    #[test]
    fn test_render_keeps_output_within_xml_char_range() {
        // Arrange
        let guide = Guide {
            channels: vec![channel("RT\u{1}P1", "RTP\u{85}1", 1)],
            programs: vec![program("RT\u{1}P1", 20, "Tele\u{FFFF}jornal")],
        };

        // Act
        let xml = render_string(&guide);

        // Assert
        assert!(xml.chars().all(is_xml_char));
        assert!(xml.contains(r#"<channel id="RTP1">"#));
        assert!(xml.contains(r#"channel="RTP1""#));
        assert!(xml.contains("RTP\u{85}1</display-name>"));
        assert!(xml.contains("Telejornal</title>"));
    }

    #[test]
    fn test_render_orders_programmes_and_drops_unknown_channels() {
        // Arrange
        let guide = Guide {
            channels: vec![channel("SIC", "SIC", 3), channel("RTP1", "RTP 1", 1)],
            programs: vec![
                program("SIC", 20, "Jornal da Noite"),
                program("RTP1", 21, "Filme"),
                program("CNN", 20, "News"),
                program("RTP1", 20, "Telejornal"),
            ],
        };

        // Act
        let xml = render_string(&guide);

        // Assert
        assert!(!xml.contains("News"));
        let telejornal = xml.find("Telejornal").unwrap();
        let filme = xml.find("Filme").unwrap();
        let jornal = xml.find("Jornal da Noite").unwrap();
        assert!(telejornal < filme);
        assert!(filme < jornal);
    }

    #[test]
    fn test_render_without_language() {
        // Arrange
        let guide = Guide {
            channels: vec![channel("RTP1", "RTP 1", 1)],
            programs: vec![program("RTP1", 20, "Telejornal")],
        };
        let info = GeneratorInfo {
            language: None,
            ..GeneratorInfo::default()
        };

        // Act
        let xml = String::from_utf8(render(&guide, &info).unwrap()).unwrap();

        // Assert
        assert!(!xml.contains("lang="));
        assert!(xml.contains("<title>Telejornal</title>"));
    }

    #[test]
    fn test_render_is_deterministic() {
        // Arrange
        let guide = Guide {
            channels: vec![channel("RTP1", "RTP 1", 1)],
            programs: vec![program("RTP1", 20, "Telejornal")],
        };

        // Act
        let first = render(&guide, &GeneratorInfo::default()).unwrap();
        let second = render(&guide, &GeneratorInfo::default()).unwrap();

        // Assert
        assert_eq!(first, second);
    }

    #[test]
    fn test_write_guide_creates_parent_directories() {
        // Arrange
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("guide.xml");
        let guide = Guide {
            channels: vec![channel("RTP1", "RTP 1", 1)],
            programs: Vec::new(),
        };

        // Act
        write_guide(&path, &guide, &GeneratorInfo::default()).unwrap();

        // Assert
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, render(&guide, &GeneratorInfo::default()).unwrap());
    }

    #[test]
    fn test_write_guide_reports_path_on_failure() {
        // Arrange
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let path = blocker.join("guide.xml");

        // Act
        let result = write_guide(&path, &Guide::default(), &GeneratorInfo::default());

        // Assert
        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("blocker"), "{err}");
    }
}
