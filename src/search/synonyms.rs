//! Colloquial-to-manual terminology expansion.
//!
//! Owners type "check engine light" and "serpentine belt"; the manual says
//! "malfunction indicator lamp" and "accessory drive belt". The dictionary
//! below maps the former to the latter so the expanded query can reach pages
//! the literal one misses.

use std::sync::LazyLock;

/// Phrase → canonical terms, in dictionary order.
pub(crate) const SYNONYMS: &[(&str, &[&str])] = &[
    ("check engine light", &["MIL", "malfunction indicator lamp"]),
    ("check engine", &["MIL", "malfunction indicator lamp"]),
    ("engine light", &["MIL", "malfunction indicator lamp"]),
    ("serpentine belt", &["drive belt", "accessory drive belt"]),
    ("accessory belt", &["drive belt", "accessory drive belt"]),
    ("fan belt", &["drive belt"]),
    ("fuse box", &["fuse block"]),
    ("fusebox", &["fuse block"]),
    ("torque specs", &["tightening torques", "fastener tightening specifications"]),
    ("torque specifications", &["tightening torques", "fastener tightening specifications"]),
    ("torque spec", &["tightening torques", "fastener tightening specifications"]),
    ("bolt torque", &["tightening torques", "fastener tightening specifications"]),
    ("oil change", &["engine oil", "oil change reminder"]),
    ("tranny", &["transmission", "transaxle"]),
    ("trans fluid", &["transmission fluid"]),
    ("tranny fluid", &["transmission fluid"]),
    ("o2 sensor", &["oxygen sensor", "heated oxygen sensor"]),
    ("oxygen sensor", &["heated oxygen sensor"]),
    ("cat converter", &["catalytic converter"]),
    ("catalytic", &["catalytic converter"]),
    ("power window", &["window regulator", "window motor"]),
    ("window motor", &["window regulator"]),
    ("ac", &["air conditioning", "A/C", "HVAC"]),
    ("a/c", &["air conditioning", "HVAC"]),
    ("air conditioning", &["A/C", "HVAC"]),
    ("heater core", &["heater", "HVAC"]),
    ("abs light", &["ABS indicator", "anti-lock brake"]),
    ("abs", &["anti-lock brake", "electronic brake control"]),
    ("anti lock", &["ABS", "electronic brake control"]),
    ("turn signal", &["directional signal", "turn signal lamp"]),
    ("blinker", &["turn signal", "directional signal"]),
    ("parking brake", &["park brake"]),
    ("e brake", &["park brake", "parking brake"]),
    ("emergency brake", &["park brake", "parking brake"]),
    ("gas tank", &["fuel tank"]),
    ("gas pump", &["fuel pump"]),
    ("gas filter", &["fuel filter"]),
    ("muffler", &["exhaust system", "exhaust muffler"]),
    ("tail pipe", &["exhaust system", "exhaust tail pipe"]),
    ("header", &["exhaust manifold"]),
    ("headers", &["exhaust manifold"]),
    ("lug nut", &["wheel nut", "wheel stud"]),
    ("hub bearing", &["wheel bearing", "wheel hub"]),
    ("wheel hub", &["wheel bearing"]),
    ("cv joint", &["drive shaft", "constant velocity"]),
    ("cv axle", &["drive shaft", "front drive axle"]),
    ("tie rod", &["tie rod end", "steering linkage"]),
    ("ball joint", &["ball stud", "ball joint"]),
    ("control arm", &["suspension arm", "control arm"]),
    ("sway bar", &["stabilizer shaft", "stabilizer bar"]),
    ("stabilizer", &["stabilizer shaft", "stabilizer bar"]),
    ("shock absorber", &["shock absorber", "suspension strut"]),
    ("struts", &["suspension strut", "shock absorber"]),
    ("coil pack", &["ignition coil module"]),
    ("ignition coil", &["ignition coil module"]),
    ("plug wire", &["spark plug wire", "ignition coil"]),
    ("timing belt", &["timing chain", "timing components"]),
    ("head gasket", &["cylinder head gasket"]),
    ("valve cover", &["camshaft cover"]),
    ("valve cover gasket", &["camshaft cover seal", "camshaft cover gasket"]),
    ("pcv valve", &["positive crankcase ventilation", "PCV"]),
    ("map sensor", &["manifold absolute pressure"]),
    ("maf sensor", &["mass air flow"]),
    ("mass air flow", &["mass air flow sensor", "MAF"]),
    ("tps", &["throttle position sensor"]),
    ("iac", &["idle air control"]),
    ("egr", &["exhaust gas recirculation"]),
    ("evap", &["evaporative emission"]),
    ("coolant temp sensor", &["engine coolant temperature sensor", "ECT"]),
    ("water pump", &["water pump", "coolant pump"]),
    ("thermostat housing", &["thermostat", "thermostat housing"]),
    ("freeze plug", &["core plug", "expansion plug"]),
    ("dome light", &["courtesy lamp", "interior lamp"]),
    ("interior light", &["courtesy lamp", "interior lamp"]),
    ("tail light", &["tail lamp"]),
    ("brake light", &["stop lamp", "brake lamp"]),
    ("headlight", &["headlamp"]),
    ("headlamp", &["headlamp assembly", "headlamp bulb"]),
    ("fog light", &["fog lamp"]),
    ("running light", &["daytime running lamp"]),
    ("key fob", &["keyless entry", "remote control"]),
    ("remote start", &["remote start", "keyless entry"]),
    ("door lock actuator", &["door lock actuator", "door lock motor"]),
    ("blend door", &["air door actuator", "HVAC actuator"]),
    ("blower motor", &["blower motor", "HVAC blower"]),
    ("cabin filter", &["cabin air filter", "air filter"]),
    ("air filter", &["air cleaner", "air filter element"]),
];

/// Dictionary entries ordered longest phrase first.
///
/// The sort is stable, so phrases of equal length keep dictionary order.
static PHRASES_LONGEST_FIRST: LazyLock<Vec<(&'static str, &'static [&'static str])>> =
    LazyLock::new(|| {
        let mut phrases = SYNONYMS.to_vec();
        phrases.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
        phrases
    });

/// Result of expanding one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub original: String,
    /// Original query plus appended synonym terms, or identical to
    /// `original` when no phrase matched.
    pub expanded: String,
    pub matched_phrases: Vec<&'static str>,
}

impl Expansion {
    /// True when the expansion added anything.
    pub fn is_expanded(&self) -> bool {
        self.expanded != self.original
    }
}

/// Characters allowed on either side of a phrase match.
fn is_boundary(c: char) -> bool {
    c.is_whitespace() || c == '/' || c == '-'
}

/// Byte offset of the first bounded occurrence of `phrase` in `text`.
fn find_bounded(text: &str, phrase: &str) -> Option<usize> {
    text.match_indices(phrase).map(|(start, _)| start).find(|&start| {
        let end = start + phrase.len();
        let before_ok = text[..start].chars().next_back().is_none_or(is_boundary);
        let after_ok = text[end..].chars().next().is_none_or(is_boundary);
        before_ok && after_ok
    })
}

/// Expands `query` with canonical terms for every dictionary phrase it contains.
///
/// Phrases are tried longest first and only match on word boundaries, so
/// "replacement" never fires the "ac" rule. A matched phrase is blanked out
/// of the working copy, which keeps "check engine light" from also firing
/// "check engine" and "engine light".
pub fn expand_query(query: &str) -> Expansion {
    let mut working = format!(" {} ", query.trim().to_lowercase());
    let mut extra: Vec<&'static str> = Vec::new();
    let mut matched_phrases = Vec::new();

    for &(phrase, synonyms) in PHRASES_LONGEST_FIRST.iter() {
        if find_bounded(&working, phrase).is_none() {
            continue;
        }

        extra.extend_from_slice(synonyms);
        matched_phrases.push(phrase);

        // Blank the first literal occurrence, bounded or not
        if let Some(start) = working.find(phrase) {
            working.replace_range(start..start + phrase.len(), " ");
        }
    }

    let expanded = if extra.is_empty() {
        query.to_string()
    } else {
        format!("{} {}", query, extra.join(" "))
    };

    if !matched_phrases.is_empty() {
        tracing::debug!("Expanded {:?} via {:?}", query, matched_phrases);
    }

    Expansion {
        original: query.to_string(),
        expanded,
        matched_phrases,
    }
}
