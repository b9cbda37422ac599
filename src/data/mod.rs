/// Data layer: loading, table registry, year selection and projections.
///
/// Architecture:
/// ```text
///     data.json
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  read + parse → Document (memoized)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ registry │  Section → Table (rows by year, columns in file order)
///   └──────────┘
///        │            ┌──────────┐
///        │◄───────────│ selector │  bounded year
///        ▼            └──────────┘
///   ┌───────────┐
///   │ projector │  slice / melt / top-N / ratio / percentages
///   └───────────┘
/// ```

pub mod loader;
pub mod model;
pub mod projector;
pub mod registry;
pub mod selector;
