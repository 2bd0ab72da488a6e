use std::path::Path;

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{EnumDepthLimitMode, EnumPatternMode, ScanError};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypePatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SpecScanPatterns {
    pub(crate) patterns_include_files: Option<TypePatternSeq>,
    pub(crate) patterns_exclude_files: Option<TypePatternSeq>,
    pub(crate) patterns_exclude_dirs: Option<TypePatternSeq>,
}

impl SpecScanPatterns {
    pub(crate) fn from_raw(
        patterns_include_files: Option<&[String]>,
        patterns_exclude_files: Option<&[String]>,
        patterns_exclude_dirs: Option<&[String]>,
        rule_pattern: EnumPatternMode,
    ) -> Result<Self, ScanError> {
        Ok(Self {
            patterns_include_files: _compile(patterns_include_files, rule_pattern)?,
            patterns_exclude_files: _compile(patterns_exclude_files, rule_pattern)?,
            patterns_exclude_dirs: _compile(patterns_exclude_dirs, rule_pattern)?,
        })
    }
}

fn _compile(
    patterns: Option<&[String]>,
    rule_pattern: EnumPatternMode,
) -> Result<Option<TypePatternSeq>, ScanError> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };
    if patterns.is_empty() {
        return Ok(None);
    }

    match rule_pattern {
        EnumPatternMode::Literal => Ok(Some(TypePatternSeq::Literal(patterns.to_vec()))),
        EnumPatternMode::Glob => {
            let mut l_glob = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let matcher = Glob::new(pattern)
                    .map_err(|e| ScanError::InvalidPattern(e.to_string()))?
                    .compile_matcher();
                l_glob.push(matcher);
            }
            Ok(Some(TypePatternSeq::Glob(l_glob)))
        }
        EnumPatternMode::Regex => {
            let mut l_regex = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex =
                    Regex::new(pattern).map_err(|e| ScanError::InvalidPattern(e.to_string()))?;
                l_regex.push(regex);
            }
            Ok(Some(TypePatternSeq::Regex(l_regex)))
        }
    }
}

fn _is_pattern_matching(value: &str, patterns: &TypePatternSeq) -> bool {
    match patterns {
        TypePatternSeq::Literal(v) => v.iter().any(|p| value.contains(p.as_str())),
        TypePatternSeq::Glob(v) => v.iter().any(|p| p.is_match(value)),
        TypePatternSeq::Regex(v) => v.iter().any(|p| p.is_match(value)),
    }
}

pub(crate) fn should_exclude_by_patterns(
    value: &str,
    patterns_include: Option<&TypePatternSeq>,
    patterns_exclude: Option<&TypePatternSeq>,
) -> bool {
    let if_included = patterns_include.is_none_or(|p| _is_pattern_matching(value, p));
    let if_excluded = patterns_exclude.is_some_and(|p| _is_pattern_matching(value, p));
    !if_included || if_excluded
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

pub(crate) fn is_depth_within_limit(
    depth_value: usize,
    depth_limit: Option<usize>,
    rule_depth_limit: EnumDepthLimitMode,
) -> bool {
    match depth_limit {
        None => true,
        Some(limit) => match rule_depth_limit {
            EnumDepthLimitMode::AtMost => depth_value <= limit,
            EnumDepthLimitMode::Exact => depth_value == limit,
        },
    }
}

/// Whether files one level below `depth_value` can still match.
pub(crate) fn should_descend(depth_value: usize, depth_limit: Option<usize>) -> bool {
    depth_limit.is_none_or(|limit| depth_value < limit)
}

/// Case-insensitive extension check (`data.CSV` matches `csv`).
pub fn has_extension_ignore_case(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Worker count for a batch: explicit value clamped to `[1, n_cpu]`,
/// otherwise `n_cpu` capped at 8.
pub fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
