//! Boilerplate recognition for certificate text.
//!
//! Page headers, footers and verification notices are repeated on every page
//! of a certificate and end up interleaved with the folio list, sometimes
//! glued to the end of a property name with no line break in between
//! (`...INMOBILIARIALa validez de este documento...`). Removal is surgical:
//! only the matched boilerplate is cut, never the surrounding text.
//!
//! Matching ignores case and accents, so `podrá`/`podra` and
//! `MATRÍCULA`/`Matricula` are the same phrase.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    VerificationNotice,
    RegistryOffice,
    CertificateBanner,
    MatriculaBanner,
    PinFooter,
    MatriculaFooter,
    PageNumber,
    PrintStamp,
    VisualRule,
}

struct NoisePattern {
    kind: NoiseKind,
    /// Literal words, compiled case- and accent-tolerant.
    phrase: &'static str,
    /// Raw regex appended after the phrase. `{office}` expands to
    /// [`OFFICE_CITIES`] followed by a single-word fallback.
    tail: &'static str,
}

/// Registry offices whose city name runs to more than one word. Single-word
/// cities are matched by shape alone.
const OFFICE_CITIES: &[&str] = &[
    "SANTA MARTA",
    "SANTA ROSA DE CABAL",
    "SANTA ROSA DE OSOS",
    "SANTA ROSA DE VITERBO",
    "SANTA FE DE ANTIOQUIA",
    "SANTA BARBARA",
    "SANTO TOMAS",
    "SAN GIL",
    "SAN ANDRES",
    "SAN JOSE DEL GUAVIARE",
    "SAN VICENTE DEL CAGUAN",
    "SAN MARCOS",
    "SAN JUAN DEL CESAR",
    "SAN MARTIN",
    "SAN ONOFRE",
    "SAN PEDRO DE LOS MILAGROS",
    "PUERTO BERRIO",
    "PUERTO ASIS",
    "PUERTO CARRENO",
    "PUERTO INIRIDA",
    "PUERTO BOYACA",
    "PUERTO TEJADA",
    "PUERTO LOPEZ",
    "LA PLATA",
    "LA CEJA",
    "LA UNION",
    "LA DORADA",
    "LA MESA",
    "LA PALMA",
    "EL BANCO",
    "EL CARMEN DE BOLIVAR",
    "EL CERRITO",
    "EL SANTUARIO",
    "EL ESPINAL",
    "AGUA DE DIOS",
    "SANTANDER DE QUILICHAO",
    "SAN JUAN DE RIO SECO",
];

const PATTERNS: &[NoisePattern] = &[
    NoisePattern {
        kind: NoiseKind::VerificationNotice,
        phrase: "La validez de este documento podra verificarse en la pagina",
        tail: r"(?:\s*certificados\.supernotariado\.gov\.co)?",
    },
    NoisePattern {
        kind: NoiseKind::RegistryOffice,
        phrase: "OFICINA DE REGISTRO DE INSTRUMENTOS PUBLICOS DE",
        tail: r"\s+(?P<office>{office}(?:\s+D\.\s?C\.)?(?:\s+-?\s*ZONA\s+(?-i:[A-Z]+))?)",
    },
    NoisePattern {
        kind: NoiseKind::CertificateBanner,
        phrase: "CERTIFICADO DE TRADICION",
        tail: r"(?:\s+Y\s+LIBERTAD)?",
    },
    NoisePattern {
        kind: NoiseKind::MatriculaBanner,
        phrase: "MATRICULA INMOBILIARIA",
        tail: "",
    },
    NoisePattern {
        kind: NoiseKind::PinFooter,
        phrase: "Certificado generado con el Pin No",
        tail: r":?\s*\d*",
    },
    NoisePattern {
        kind: NoiseKind::MatriculaFooter,
        phrase: "Nro Matricula:",
        tail: r"[ \t]*(?:\d+[A-Za-z]?-\d+)?(?:[ \t]*,[ \t]*(?:\d+[A-Za-z]?-\d+)?)*",
    },
    NoisePattern {
        kind: NoiseKind::PageNumber,
        phrase: "Pagina",
        tail: r":?[ \t]*\d+(?:[ \t]+de[ \t]+\d+)?",
    },
    NoisePattern {
        kind: NoiseKind::PrintStamp,
        phrase: "Impreso el",
        tail: r"[ \t]+\d{1,2}[ \t]+de[ \t]+\w+[ \t]+de[ \t]+\d{4}(?:[ \t]+a[ \t]+las[ \t]+\d{1,2}:\d{2}(?::\d{2})?[ \t]*[AP]\.?[ \t]?M\.?)?",
    },
    NoisePattern {
        kind: NoiseKind::VisualRule,
        phrase: "",
        tail: r"[ \t]*-?[ \t]*(?:=[ \t]*){3,}\.?",
    },
];

/// Compile a literal phrase into a case- and accent-tolerant regex fragment.
fn tolerant(phrase: &str) -> String {
    let mut out = String::with_capacity(phrase.len() * 4);
    for c in phrase.chars() {
        match c.to_lowercase().next().unwrap_or(c) {
            'a' | 'á' => out.push_str("[aá]"),
            'e' | 'é' => out.push_str("[eé]"),
            'i' | 'í' => out.push_str("[ií]"),
            'o' | 'ó' => out.push_str("[oó]"),
            'u' | 'ú' | 'ü' => out.push_str("[uúü]"),
            'n' | 'ñ' => out.push_str("[nñ]"),
            ' ' => out.push_str(r"\s+"),
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out
}

/// Known multi-word cities first, longest first, then one uppercase word.
/// The fallback is case-sensitive so it stops at glued lowercase text.
fn office_name() -> String {
    let mut cities: Vec<&str> = OFFICE_CITIES.to_vec();
    cities.sort_by_key(|c| std::cmp::Reverse(c.len()));
    let known: Vec<String> = cities.iter().map(|c| tolerant(c)).collect();
    format!(r"(?:{}|(?-i:[A-ZÁÉÍÓÚÑ]+))", known.join("|"))
}

static COMPILED: Lazy<Vec<(NoiseKind, Regex)>> = Lazy::new(|| {
    let office = office_name();
    PATTERNS
        .iter()
        .map(|p| {
            let tail = p.tail.replace("{office}", &office);
            let pattern = format!("(?i){}{}", tolerant(p.phrase), tail);
            (p.kind, Regex::new(&pattern).expect("static noise pattern"))
        })
        .collect()
});

/// The first kind of boilerplate found in `text`, if any.
pub fn noise_kind(text: &str) -> Option<NoiseKind> {
    COMPILED
        .iter()
        .filter_map(|(kind, re)| re.find(text).map(|m| (m.start(), *kind)))
        .min_by_key(|(start, _)| *start)
        .map(|(_, kind)| kind)
}

/// Whether a whole line is boilerplate: nothing but whitespace is left once
/// every recognised phrase is cut out. Blank lines are not noise.
pub fn is_noise(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && strip_noise(trimmed).trim().is_empty()
}

/// The registry office named in a certificate header, e.g. `MANIZALES` or
/// `BOGOTA D.C. - ZONA NORTE`.
pub fn registry_office(text: &str) -> Option<String> {
    let (_, re) = COMPILED
        .iter()
        .find(|(kind, _)| *kind == NoiseKind::RegistryOffice)?;
    let office = re.captures(text)?.name("office")?;
    Some(office.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Cut every recognised phrase out of `text`.
///
/// Each match is replaced by a single space (or a newline when the match
/// itself spanned lines) so that the fragments on either side never fuse
/// into one word. Whitespace is otherwise left alone; callers normalise it.
pub fn strip_noise(text: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(text);
    for (_, re) in COMPILED.iter() {
        if re.is_match(&out) {
            let replaced = re
                .replace_all(&out, |caps: &Captures| {
                    if caps[0].contains('\n') { "\n" } else { " " }
                })
                .into_owned();
            out = Cow::Owned(replaced);
        }
    }
    out
}
