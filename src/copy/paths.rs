// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lexical path helpers shared by both endpoints.
//!
//! All paths handled by the copy engine are strings with `/` separators,
//! optionally starting with a Windows drive designator (`C:/...`). Nothing
//! here touches a filesystem.

/// Lexically clean a slash-separated path.
///
/// Collapses repeated separators, drops `.` elements, resolves `..` against
/// the preceding element and strips trailing separators. An empty result
/// becomes `.`. A drive designator is only recognised as the first element
/// of a non-rooted path; below it the path behaves as rooted, so `C:/` and
/// `C:/x/..` both clean to `C:/`. A bare `C:` is left alone.
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    match leading_drive(path) {
        Some(drive) if path.len() == drive.len() => drive.to_string(),
        Some(drive) => format!("{drive}{}", clean_elements(&path[drive.len()..], true)),
        None => clean_elements(path, path.starts_with('/')),
    }
}

fn clean_elements(path: &str, rooted: bool) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            _ => parts.push(part),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Last element of a cleaned path.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "." } else { "/" };
    }
    match trimmed.rfind('/') {
        Some(index) => &trimmed[index + 1..],
        None => trimmed,
    }
}

/// Parent directory of a path, cleaned.
///
/// The parent of a root (`/`, `C:/`) is the root itself, the parent of a
/// single relative element is `.`.
pub fn parent(path: &str) -> String {
    let cleaned = clean(path);
    if cleaned == "/" || is_drive_root(&cleaned) {
        return cleaned;
    }
    match cleaned.rfind('/') {
        Some(0) => "/".to_string(),
        Some(2) if leading_drive(&cleaned).is_some() => cleaned[..3].to_string(),
        Some(index) => clean(&cleaned[..index]),
        None => ".".to_string(),
    }
}

/// Join `name` (one or more slash-separated elements) onto `base`.
pub fn join(base: &str, name: &str) -> String {
    if name.is_empty() {
        return clean(base);
    }
    if base.ends_with('/') {
        clean(&format!("{base}{name}"))
    } else {
        clean(&format!("{base}/{name}"))
    }
}

/// Replace a leading `~` with `home`.
///
/// Only the first character is ever substituted; a `~` anywhere else in the
/// path is kept verbatim.
pub fn expand_tilde(path: &str, home: &str) -> String {
    match path.strip_prefix('~') {
        Some(rest) => format!("{home}{rest}"),
        None => path.to_string(),
    }
}

/// Convert every backslash into a forward slash.
pub fn backslashes_to_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Whether `s` is exactly a drive designator such as `C:`.
pub fn is_drive(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// The drive designator opening a non-rooted path, e.g. `C:` in `C:/out`.
fn leading_drive(path: &str) -> Option<&str> {
    path.split('/').next().filter(|first| is_drive(first))
}

fn is_drive_root(s: &str) -> bool {
    s.len() == 3 && s.ends_with('/') && is_drive(&s[..2])
}
