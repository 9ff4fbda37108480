//! Integration tests: setup → event loop → post-processing → write → close.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use hb_core::{AxisSpec, BinnedAccumulator, ContainerKind, StoredObject};
use hb_hist::{MemorySink, OutputFile};
use hb_registry::{BookingConfig, KeySpec, Registry, WriteFilter};

fn tmp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("histbook_registry_{}_{}_{}.json", std::process::id(), nanos, name));
    p
}

struct Event {
    muon_pt: Vec<f64>,
    weight: f64,
    triggered: bool,
}

fn events() -> Vec<Event> {
    vec![
        Event { muon_pt: vec![35.0, 12.0], weight: 1.0, triggered: true },
        Event { muon_pt: vec![55.0], weight: -0.5, triggered: false },
        Event { muon_pt: vec![], weight: 2.0, triggered: true },
        Event { muon_pt: vec![5.0, 4.0, 3.0], weight: 1.0, triggered: false },
    ]
}

fn setup() -> Registry {
    let mut reg = Registry::new();
    let pt = AxisSpec::new(10, 0.0, 100.0).titled("p_T [GeV]");
    reg.create_hist1d_family(2, "pt", Some("Muon"), &pt).unwrap();
    reg.create_hist1d("h_counters", &AxisSpec::new(3, 0.0, 3.0)).unwrap();
    reg.create_hist1d("n_muons", &AxisSpec::new(5, 0.0, 5.0)).unwrap();
    reg.create_efficiency("trigger", &pt).unwrap();
    reg.create_sparse("kin", &[pt.clone(), AxisSpec::new(5, 0.0, 5.0)]).unwrap();

    let mut fields = BTreeMap::new();
    fields.insert("n_muons".to_string(), 0.0);
    fields.insert("lead_pt".to_string(), -1.0);
    reg.create_tree(&fields, "events").unwrap();
    reg
}

fn run_loop(reg: &mut Registry) {
    for ev in events() {
        reg.fill_1d("h_counters", 0.5, 1.0);
        reg.fill_1d("n_muons", ev.muon_pt.len() as f64, ev.weight);
        for (i, &pt) in ev.muon_pt.iter().take(2).enumerate() {
            reg.fill_1d(KeySpec::new("pt").index(i).particle("Muon"), pt, ev.weight);
        }
        if let Some(&lead) = ev.muon_pt.first() {
            reg.fill_eff("trigger", lead, ev.triggered);
            reg.fill_sparse("kin", &[lead, ev.muon_pt.len() as f64], ev.weight).unwrap();
        }
        // misspelled name must not interrupt the loop
        reg.fill_1d("n_muon", 1.0, 1.0);

        let cells = reg.fields_mut("events").unwrap();
        cells.set("n_muons", ev.muon_pt.len() as f64);
        cells.set("lead_pt", ev.muon_pt.first().copied().unwrap_or(-1.0));
        reg.fill_tree("events");
    }
}

#[test]
fn full_run_to_output_file() {
    let mut reg = setup();
    run_loop(&mut reg);

    let stats = reg.stats();
    assert_eq!(stats.misses, 4);

    let counters = reg.hist1d("h_counters").unwrap();
    assert_eq!(counters.bin_content(1), 4.0);

    let lead = reg.hist1d(KeySpec::new("pt").index(0).particle("Muon")).unwrap();
    assert_eq!(lead.bin_content(4), 1.0);
    assert_eq!(lead.bin_content(6), -0.5);
    assert_eq!(lead.bin_content(1), 1.0);

    assert_eq!(reg.zero_negative_bins(KeySpec::new("pt").index(0).particle("Muon")), Some(1));
    assert_eq!(reg.zero_negative_bins_all(), 1);
    assert!(reg.assign_bin_labels("h_counters", &["all", "trigger", "iso"]));

    let path = tmp_path("full_run");
    let mut out = OutputFile::create(&path);
    out.cd("Muons");
    let n = reg.write_all(&mut out, &WriteFilter::substring("Muon")).unwrap();
    assert_eq!(n, 2);
    out.cd("/");
    let summary = reg.close(&mut out).unwrap();
    assert_eq!(summary.hist1d, 4);
    assert_eq!(summary.records, 1);
    assert_eq!(summary.sparse, 1);
    assert_eq!(summary.efficiency, 1);
    out.finish().unwrap();

    let root = OutputFile::read(&path).unwrap();
    assert_eq!(root.subdir("Muons").unwrap().object_names(), ["h1_0_Muon_pt", "h1_1_Muon_pt"]);
    match root.get("h_counters").unwrap() {
        StoredObject::Hist1D { x_axis, contents, .. } => {
            assert_eq!(x_axis.labels.get(&1).map(String::as_str), Some("all"));
            assert_eq!(contents[1], 4.0);
        }
        other => panic!("unexpected object: {other:?}"),
    }
    match root.get("tree_events").unwrap() {
        StoredObject::Tree { fields, rows, .. } => {
            assert_eq!(fields, &vec!["lead_pt".to_string(), "n_muons".to_string()]);
            assert_eq!(rows.len(), 4);
            assert_eq!(rows[2], vec![-1.0, 0.0]);
            assert_eq!(rows[3], vec![5.0, 3.0]);
        }
        other => panic!("unexpected object: {other:?}"),
    }
    match root.get("eff_trigger").unwrap() {
        StoredObject::Efficiency { passed, total, .. } => {
            assert_eq!(total.iter().sum::<f64>(), 3.0);
            assert_eq!(passed.iter().sum::<f64>(), 1.0);
        }
        other => panic!("unexpected object: {other:?}"),
    }

    let _ = std::fs::remove_file(&path);
}

#[test]
fn booking_file_drives_setup() {
    let path = tmp_path("booking").with_extension("yaml");
    std::fs::write(
        &path,
        "histograms:\n  - name: pt\n    count: 3\n    axis: { bins: 4, low: 0, high: 4 }\n",
    )
    .unwrap();

    let cfg = BookingConfig::from_path(&path).unwrap();
    let reg = Registry::from_booking(&cfg).unwrap();
    assert_eq!(reg.keys(ContainerKind::Histogram1D), ["h1_0_pt", "h1_1_pt", "h1_2_pt"]);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn filtered_bulk_write_on_mixed_keys() {
    let mut reg = Registry::new();
    let axis = AxisSpec::new(2, 0.0, 1.0);
    for name in ["xAy", "xBy", "xABy", "xy"] {
        reg.create_hist1d(name, &axis).unwrap();
    }

    let mut sink = MemorySink::new();
    reg.write_all(&mut sink, &WriteFilter::all().include("A:B")).unwrap();
    assert_eq!(sink.names(), ["h1_xABy"]);

    let mut sink = MemorySink::new();
    reg.write_all(&mut sink, &WriteFilter::all().include("A").exclude("B")).unwrap();
    assert_eq!(sink.names(), ["h1_xAy"]);
}
