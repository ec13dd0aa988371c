/// Data layer: parsing, normalization, imputation and projection.
///
/// Architecture:
/// ```text
///  DataBank export (.csv)            previously converted (.json)
///        │                                   │
///        ▼                                   │
///   ┌──────────┐                             │
///   │  parser   │  text → Vec<RawRow>         │
///   └──────────┘                             │
///        │                                   │
///        ▼                                   │
///   ┌───────────┐  + metadata: descriptor /  │
///   │ normalize │    unit / symbol per key   │
///   └───────────┘                            │
///        │                                   │
///        ▼                                   │
///   ┌──────────┐                             │
///   │  impute   │  forward-carry gaps         │
///   └──────────┘                             │
///        │                                   │
///        ▼                                   ▼
///   ┌───────────────────┐
///   │ NormalizedDataset │  region → indicator → year → value
///   └───────────────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ projection │  accessors → DataPoints, x/y/z → Extremes
///   └────────────┘
/// ```

pub mod impute;
pub mod loader;
pub mod metadata;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod projection;
