//! Shared test fixtures for integration tests.
//!
//! # Available Fixtures
//!
//! - `sample_corpus`: a small manual export on disk with duplicate titles, a
//!   directory page, a labor page, a bulletin, and pages only reachable
//!   through body text
//! - `built_corpus`: `sample_corpus` with artifacts already built into `out/`
//!
//! [`TempWorkspace`] provides the temp directory underneath both.

use manual_search::{BuildConfig, BuildReport, build_index};
use rstest::fixture;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ROOT_CRUMB: &str = "SRX AWD V8-4.6L";

/// A temporary directory that is removed when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content, creating parent directories.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// One exported manual page.
#[derive(Debug, Clone)]
pub struct ManualPage {
    pub id: u32,
    pub title: String,
    /// Segments after the root crumb.
    pub crumbs: Vec<String>,
    pub main_html: String,
    pub nav: bool,
}

#[allow(dead_code)]
impl ManualPage {
    pub fn new(id: u32, title: &str, crumbs: &[&str], body: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            crumbs: crumbs.iter().map(|c| (*c).to_string()).collect(),
            main_html: format!("<h1>{}</h1><p>{}</p>", title, body),
            nav: false,
        }
    }

    pub fn directory(id: u32, title: &str, crumbs: &[&str], links: &[&str]) -> Self {
        let items: String = links
            .iter()
            .enumerate()
            .map(|(i, label)| format!("<li><a href=\"{}.html\">{}</a></li>", i + 1, label))
            .collect();
        Self {
            id,
            title: title.to_string(),
            crumbs: crumbs.iter().map(|c| (*c).to_string()).collect(),
            main_html: format!("<h1>{}</h1><ul>{}</ul>", title, items),
            nav: true,
        }
    }

    pub fn with_main_html(mut self, html: &str) -> Self {
        self.main_html = html.to_string();
        self
    }

    pub fn to_html(&self) -> String {
        let mut crumbs = String::from("<a class=\"breadcrumb-part\" href=\"/\">Home</a>");
        crumbs.push_str(&format!("<a class=\"breadcrumb-part\" href=\"/\">{}</a>", ROOT_CRUMB));
        for crumb in &self.crumbs {
            crumbs.push_str(&format!("<a class=\"breadcrumb-part\" href=\"#\">{}</a>", crumb));
        }
        let expand = if self.nav { "<button id=\"expand-all\">Expand All</button>" } else { "" };
        format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
             <title>{} - 2008 Cadillac SRX AWD V8-4.6L</title></head>\
             <body><nav>{}</nav>{}<div class=\"main\">{}</div></body></html>",
            self.title, crumbs, expand, self.main_html
        )
    }
}

const REPAIR: &str = "Repair and Diagnosis";

/// Pages of the sample corpus.
pub fn sample_pages() -> Vec<ManualPage> {
    vec![
        ManualPage::new(
            1,
            "Thermostat Replacement",
            &[REPAIR, "Engine", "Cooling System", "Service and Repair"],
            "Drain the cooling system. Remove the thermostat housing bolts and lift the thermostat out of the housing.",
        ),
        ManualPage::new(
            2,
            "Thermostat Replacement",
            &["Parts and Labor", "Cooling System", "Labor Times"],
            "Labor time for thermostat replacement including coolant refill and bleed procedure.",
        )
        .with_main_html(
            "<h1>Thermostat Replacement</h1><table class=\"labor-times-table\"><tr><td>Thermostat R&amp;R</td><td>1.4</td></tr></table>\
             <p>Labor time for thermostat replacement including coolant refill and bleed procedure.</p>",
        ),
        ManualPage::new(
            3,
            "Water Pump Replacement",
            &[REPAIR, "Engine", "Cooling System", "Service and Repair"],
            "Remove the drive belt and the water pump pulley, then remove the pump bolts and the water pump.",
        ),
        ManualPage::new(
            4,
            "Fuel Pump Relay Locations",
            &[REPAIR, "Powertrain Management", "Fuel Delivery", "Locations"],
            "The fuel pump relay is located in the underhood fuse block, position K4.",
        ),
        ManualPage::new(
            5,
            "Anti-Lock Brake System Description",
            &[REPAIR, "Brakes", "Antilock Brakes", "Description and Operation"],
            "The electronic brake control module monitors wheel speed sensors and modulates brake pressure.",
        ),
        ManualPage::new(
            6,
            "Engine Coolant Temperature Sensor Testing",
            &[REPAIR, "Powertrain Management", "Sensors", "Testing and Inspection"],
            "Measure the resistance across the ECT sensor terminals and compare with the temperature table.",
        ),
        ManualPage::new(
            7,
            "Tire Noise at Highway Speed",
            &[REPAIR, "Technical Service Bulletins"],
            "Bulletin No.: 08-03-10-006 Some customers may comment on a growl or hum from the rear at highway speed.",
        ),
        ManualPage::directory(
            8,
            "Cooling System",
            &[REPAIR, "Engine", "Cooling System"],
            &["Thermostat Replacement", "Water Pump Replacement"],
        ),
        ManualPage::new(9, "Radiator Cap", &[REPAIR, "Engine", "Cooling System", "Specifications"], "15 psi."),
        ManualPage::new(
            10,
            "Serpentine Belt Routing",
            &[REPAIR, "Engine", "Drive Belts", "Diagrams"],
            "The serpentine belt passes over the alternator, power steering pump, and idler pulley in sequence.",
        ),
        ManualPage::new(
            11,
            "Señal de Giro — Turn Signal Lamp",
            &[REPAIR, "Lighting and Horns", "Service and Repair"],
            "Replace the turn signal bulb by rotating the socket a quarter turn counterclockwise. Größe 3157.",
        ),
    ]
}

/// Writes `pages` as `pages/<id>.html` under the workspace root.
pub fn write_corpus(workspace: &TempWorkspace, pages: &[ManualPage]) {
    for page in pages {
        workspace.create_file(&format!("pages/{}.html", page.id), &page.to_html());
    }
}

/// The sample corpus on disk, not yet built.
#[fixture]
pub fn sample_corpus() -> TempWorkspace {
    let workspace = TempWorkspace::new();
    write_corpus(&workspace, &sample_pages());
    workspace
}

/// A corpus together with its built artifacts.
#[allow(dead_code)]
pub struct BuiltCorpus {
    pub workspace: TempWorkspace,
    pub report: BuildReport,
}

#[allow(dead_code)]
impl BuiltCorpus {
    pub fn out_dir(&self) -> PathBuf {
        self.workspace.path().join("out")
    }
}

/// The sample corpus with artifacts built into `out/`, three content pages per shard.
#[fixture]
pub fn built_corpus(sample_corpus: TempWorkspace) -> BuiltCorpus {
    let config = BuildConfig {
        shard_size: 3,
        ..BuildConfig::default()
    };
    let out = sample_corpus.path().join("out");
    let report = build_index(sample_corpus.path(), &out, &config).expect("Build should succeed");
    BuiltCorpus {
        workspace: sample_corpus,
        report,
    }
}
