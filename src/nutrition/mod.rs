// ABOUTME: Nutrition domain logic independent of HTTP and storage
// ABOUTME: Barcode validation, model output parsing, heuristic analysis and journal summaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Model output cleanup and normalization
pub mod analysis_parser;
/// Barcode normalization and validation
pub mod barcode;
/// Threshold-based fallback analysis
pub mod heuristic;
/// Journal summaries over calendar periods
pub mod summary;

pub use analysis_parser::{clean_and_parse, normalize_value, ParsedAnalysis};
pub use heuristic::{HeuristicAnalysis, HeuristicInput};
pub use summary::{JournalCalendar, NutritionSummary, PeriodSummary, SummaryPeriod};
