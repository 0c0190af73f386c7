//! End-to-end conversion tests: IGC text in, KML text out

use chrono::NaiveDate;
use igc_kml_lib::{AltitudeSource, FixedClock, FlightModel, RenderOptions, encode_kml};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::num::NonZeroUsize;

fn test_clock() -> FixedClock {
    FixedClock(NaiveDate::from_ymd_opt(2030, 1, 2).unwrap())
}

/// Parse `kml` completely and return `(element, text)` for every non-blank text node
fn parse_kml(kml: &str) -> Vec<(String, String)> {
    let mut reader = Reader::from_str(kml);
    let mut stack: Vec<String> = Vec::new();
    let mut texts = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(String::from_utf8(e.name().as_ref().to_vec()).unwrap());
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8(e.name().as_ref().to_vec()).unwrap();
                assert_eq!(stack.pop(), Some(name));
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().expect("invalid escape").into_owned();
                if !text.trim().is_empty() {
                    texts.push((stack.last().cloned().unwrap_or_default(), text));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!(
                "KML is not well-formed at byte {}: {e}",
                reader.buffer_position()
            ),
        }
    }

    assert!(stack.is_empty(), "unclosed elements: {stack:?}");
    texts
}

fn texts_of<'a>(texts: &'a [(String, String)], element: &str) -> Vec<&'a str> {
    texts
        .iter()
        .filter(|(name, _)| name == element)
        .map(|(_, text)| text.as_str())
        .collect()
}

fn generate_igc(pilot: &str, fix_count: usize) -> String {
    let mut igc = format!(
        "AXCT0123456789\nHFDTE150824\nHFPLTPILOTINCHARGE:{pilot}\nHFGTYGLIDERTYPE:Advance Sigma 11\n"
    );
    for i in 0..fix_count {
        igc.push_str(&format!(
            "B12{:02}{:02}4601{:03}N00711{:03}EA{:05}{:05}\n",
            i / 60,
            i % 60,
            i % 1000,
            (i * 7) % 1000,
            1500 + i,
            1520 + i
        ));
    }
    igc
}

#[test]
fn test_scenario_single_fix_with_gps_altitude() {
    let igc = "HFDTE230724\nB1022301234567N00678901EA0012300150\n";
    let model = FlightModel::from_igc_str_with_clock(igc, &test_clock());

    assert_eq!(model.fixes().len(), 1);
    let fix = &model.fixes()[0];
    assert_eq!(
        fix.timestamp.date_naive(),
        NaiveDate::from_ymd_opt(2024, 7, 23).unwrap()
    );

    let options = RenderOptions {
        altitude_source: AltitudeSource::Gps,
        ..RenderOptions::default()
    };
    let kml = encode_kml(&model, &options).unwrap();
    let texts = parse_kml(&kml);

    assert_eq!(texts_of(&texts, "when"), vec!["2024-07-23T10:22:30.000Z"]);
    assert_eq!(texts_of(&texts, "gx:coord"), vec!["7.315017,12.576117,150"]);
    assert_eq!(
        texts_of(&texts, "coordinates"),
        vec!["7.315017,12.576117,150", "7.315017,12.576117,150"]
    );
}

#[test]
fn test_scenario_no_fix_records() {
    let igc = "AXCT0123456789\nHFDTE230724\nHFPLTPILOT:Jane\nLXCTsome log line\n";
    let model = FlightModel::from_igc_str_with_clock(igc, &test_clock());
    assert!(model.fixes().is_empty());

    let kml = encode_kml(&model, &RenderOptions::default()).unwrap();
    let texts = parse_kml(&kml);

    assert!(texts_of(&texts, "when").is_empty());
    assert!(texts_of(&texts, "gx:coord").is_empty());
    assert!(texts_of(&texts, "coordinates").is_empty());
    assert_eq!(texts_of(&texts, "description"), vec!["Pilot: Jane • Fixes: 0"]);
    assert_eq!(
        texts_of(&texts, "name"),
        vec!["Flight Jane flight", "Flight Jane flight"]
    );
}

#[test]
fn test_scenario_pilot_only_changes_name_and_description() {
    let first = FlightModel::from_igc_str_with_clock(&generate_igc("Alice", 20), &test_clock());
    let second = FlightModel::from_igc_str_with_clock(&generate_igc("Bob", 20), &test_clock());

    let options = RenderOptions::default();
    let kml_first = encode_kml(&first, &options).unwrap();
    let kml_second = encode_kml(&second, &options).unwrap();

    let lines_first: Vec<_> = kml_first.lines().collect();
    let lines_second: Vec<_> = kml_second.lines().collect();
    assert_eq!(lines_first.len(), lines_second.len());

    let differing: Vec<_> = lines_first
        .iter()
        .zip(&lines_second)
        .filter(|(a, b)| a != b)
        .collect();
    assert_eq!(differing.len(), 3);
    for (a, _) in differing {
        let line = a.trim_start();
        assert!(
            line.starts_with("<name>Flight Alice") || line.starts_with("<description>Pilot: Alice"),
            "unexpected difference: {line}"
        );
    }
}

#[test]
fn test_well_formed_with_one_fix() {
    let model = FlightModel::from_igc_str_with_clock(&generate_igc("Solo", 1), &test_clock());
    let kml = encode_kml(&model, &RenderOptions::default()).unwrap();
    let texts = parse_kml(&kml);

    assert_eq!(texts_of(&texts, "when").len(), 1);
    assert_eq!(texts_of(&texts, "coordinates").len(), 2);
}

#[test]
fn test_well_formed_with_special_characters() {
    let igc = "\
HFDTE150824
HFPLTPILOTINCHARGE:Tom & \"Jerry\" <Ace>
HFSITSITE:Mont <Blanc> & 'Co'
HFGPSRECEIVER:A&B<C>
B1200004601000N00711000EA0150001520
B1200014601001N00711007EA0150101521
";
    let model = FlightModel::from_igc_str_with_clock(igc, &test_clock());
    let options = RenderOptions {
        title: Some("<Flight> & \"friends\"".to_string()),
        ..RenderOptions::default()
    };
    let kml = encode_kml(&model, &options).unwrap();
    let texts = parse_kml(&kml);

    assert_eq!(
        texts_of(&texts, "name"),
        vec![
            "<Flight> & \"friends\"",
            "<Flight> & \"friends\"",
            "Takeoff",
            "Landing"
        ]
    );
    assert_eq!(
        texts_of(&texts, "description"),
        vec![
            "Pilot: Tom & \"Jerry\" <Ace> • Site: Mont <Blanc> & 'Co' • GPS: A&B<C> • Fixes: 2 • \
             From: 2024-08-15 12:00:00 UTC • To: 2024-08-15 12:00:01 UTC"
        ]
    );
}

#[test]
fn test_invalid_fixes_never_appear() {
    let igc = "\
HFDTE150824
B1200004601000N00711000EA0150001520
B1200014601001N00711007EV0150101521
B1200024601002N00711014EA0150201522
B1200034601003N00711021EV0150301523
B1200044601004N00711028EA0150401524
";
    let model = FlightModel::from_igc_str_with_clock(igc, &test_clock());
    let seconds: Vec<_> = model
        .fixes()
        .iter()
        .map(|fix| fix.timestamp.format("%S").to_string())
        .collect();
    assert_eq!(seconds, vec!["00", "02", "04"]);

    let kml = encode_kml(&model, &RenderOptions::default()).unwrap();
    let texts = parse_kml(&kml);
    assert_eq!(texts_of(&texts, "when").len(), 3);
    assert!(texts_of(&texts, "description")[0].contains("Fixes: 3"));
}

#[test]
fn test_valid_fixes_kept_once_in_input_order() {
    let model = FlightModel::from_igc_str_with_clock(&generate_igc("Order", 150), &test_clock());
    assert_eq!(model.fixes().len(), 150);
    assert!(
        model
            .fixes()
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp)
    );
    assert_eq!(
        model.fixes()[0].pressure_altitude,
        1500,
        "first record stays first"
    );
    assert_eq!(model.fixes()[149].pressure_altitude, 1649);
}

#[test]
fn test_decimation_in_document() {
    let model = FlightModel::from_igc_str_with_clock(&generate_igc("Thin", 10), &test_clock());

    for (k, expected, last_included) in [(1, 10, true), (3, 4, true), (4, 3, false), (20, 1, false)] {
        let options = RenderOptions {
            decimation_stride: NonZeroUsize::new(k).unwrap(),
            altitude_source: AltitudeSource::Pressure,
            ..RenderOptions::default()
        };
        let kml = encode_kml(&model, &options).unwrap();
        let texts = parse_kml(&kml);
        let coords = texts_of(&texts, "gx:coord");

        assert_eq!(coords.len(), expected, "stride {k}");
        assert_eq!(texts_of(&texts, "when").len(), expected, "stride {k}");
        assert!(coords[0].ends_with(",1500"));
        assert_eq!(coords.last().unwrap().ends_with(",1509"), last_included, "stride {k}");

        // Landing marks the last retained point, not the last fix
        let markers = texts_of(&texts, "coordinates");
        assert_eq!(markers[1], *coords.last().unwrap());
    }
}

#[test]
fn test_missing_date_header_uses_injected_clock() {
    let igc = "HFPLTPILOT:Nobody\nB1200004601000N00711000EA0150001520\n";
    let model = FlightModel::from_igc_str_with_clock(igc, &test_clock());

    assert_eq!(
        model.fixes()[0].timestamp.date_naive(),
        NaiveDate::from_ymd_opt(2030, 1, 2).unwrap()
    );
    let kml = encode_kml(&model, &RenderOptions::default()).unwrap();
    let texts = parse_kml(&kml);
    assert_eq!(texts_of(&texts, "when"), vec!["2030-01-02T12:00:00.000Z"]);
    assert_eq!(texts_of(&texts, "name")[0], "Flight Nobody 2030-01-02");
}

#[test]
fn test_from_reader_end_to_end() {
    let igc = generate_igc("Reader", 5);
    let model = FlightModel::from_reader(igc.as_bytes())
        .unwrap()
        .with_source_name("reader-flight");

    assert_eq!(model.suggested_file_name(), "reader-flight.kml");
    assert_eq!(model.metadata().glider.as_deref(), Some("Advance Sigma 11"));
    let kml = encode_kml(&model, &RenderOptions::default()).unwrap();
    parse_kml(&kml);
}
