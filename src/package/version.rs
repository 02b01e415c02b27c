use anyhow::{Context, Result};
use blake3::Hasher;
use log::{debug, warn};
use std::io::{self, Read};

use super::catalog::PackageCandidate;
use super::registry::{PackageInfo, Registry};
use crate::runtime::Runtime;

const BASE62_DIGITS: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Resolve a version for every candidate and freeze the result into a
/// [`Registry`]. Candidates whose entry file cannot be hashed are logged and
/// left out.
#[tracing::instrument(skip_all)]
pub fn resolve_all<R: Runtime + ?Sized>(
    runtime: &R,
    candidates: Vec<PackageCandidate>,
) -> Registry {
    let total = candidates.len();
    let packages: Vec<PackageInfo> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let name = candidate.name.clone();
            match resolve(runtime, candidate) {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!("{}: {:#}", name, e);
                    None
                }
            }
        })
        .collect();

    debug!("Resolved versions for {}/{} package(s)", packages.len(), total);
    Registry::new(packages)
}

/// Resolve one candidate's version: the declared version verbatim, or the
/// base-62 content digest of its entry file.
pub fn resolve<R: Runtime + ?Sized>(runtime: &R, candidate: PackageCandidate) -> Result<PackageInfo> {
    let resolved_version = match &candidate.declared_version {
        Some(version) if !version.is_empty() => version.clone(),
        _ => {
            let entry = candidate.entry_path();
            let reader = runtime.open(&entry)?;
            let version = content_version(reader)
                .with_context(|| format!("Failed to hash {}", entry.display()))?;
            debug!("{} has no declared version, using digest {}", candidate.name, version);
            version
        }
    };

    Ok(PackageInfo::new(candidate, resolved_version))
}

/// Stream `reader` through BLAKE3 and encode the digest in base 62.
pub fn content_version<Rd: Read>(mut reader: Rd) -> io::Result<String> {
    let mut hasher = Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(encode_base62(hasher.finalize().as_bytes()))
}

/// Encode a big-endian unsigned integer in base 62, digits `0-9a-zA-Z`,
/// most significant digit first and without leading zeros.
pub fn encode_base62(bytes: &[u8]) -> String {
    let mut number: Vec<u8> = bytes.iter().copied().skip_while(|&b| b == 0).collect();
    if number.is_empty() {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while !number.is_empty() {
        // Long division of the whole number by 62
        let mut remainder = 0u32;
        let mut quotient = Vec::with_capacity(number.len());
        for &byte in &number {
            let acc = (remainder << 8) | u32::from(byte);
            let q = acc / 62;
            remainder = acc % 62;
            if !(quotient.is_empty() && q == 0) {
                quotient.push(q as u8);
            }
        }
        digits.push(BASE62_DIGITS[remainder as usize]);
        number = quotient;
    }

    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn candidate(name: &str, declared: Option<&str>) -> PackageCandidate {
        PackageCandidate {
            name: name.to_string(),
            package_dir: PathBuf::from("node_modules").join(name),
            declared_version: declared.map(str::to_string),
            entry_import_path: "./index.js".to_string(),
        }
    }

    #[test]
    fn test_encode_base62_small_values() {
        assert_eq!(encode_base62(&[]), "0");
        assert_eq!(encode_base62(&[0, 0]), "0");
        assert_eq!(encode_base62(&[9]), "9");
        assert_eq!(encode_base62(&[10]), "a");
        assert_eq!(encode_base62(&[36]), "A");
        assert_eq!(encode_base62(&[61]), "Z");
        assert_eq!(encode_base62(&[62]), "10");
        // 256 = 4 * 62 + 8
        assert_eq!(encode_base62(&[1, 0]), "48");
        // 3843 = 61 * 62 + 61
        assert_eq!(encode_base62(&[0x0f, 0x03]), "ZZ");
    }

    #[test]
    fn test_encode_base62_ignores_leading_zero_bytes() {
        assert_eq!(encode_base62(&[0, 0, 1, 0]), encode_base62(&[1, 0]));
    }

    #[test]
    fn test_encode_base62_full_digest_is_alphanumeric() {
        let encoded = encode_base62(&[0xff; 32]);
        // 62^43 > 2^256 > 62^42
        assert_eq!(encoded.len(), 43);
        assert!(encoded.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_content_version_is_deterministic() {
        let a = content_version(Cursor::new(b"export default 1;\n")).unwrap();
        let b = content_version(Cursor::new(b"export default 1;\n")).unwrap();
        let c = content_version(Cursor::new(b"export default 2;\n")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, encode_base62(blake3::hash(b"export default 1;\n").as_bytes()));
    }

    #[test]
    fn test_resolve_declared_version_takes_precedence() {
        let mut runtime = MockRuntime::new();

        // The entry file is never opened when a version is declared
        runtime.expect_open().never();

        let info = resolve(&runtime, candidate("foo", Some("1.2.3"))).unwrap();
        assert_eq!(info.resolved_version(), "1.2.3");
    }

    #[test]
    fn test_resolve_hashes_entry_without_declared_version() {
        let mut runtime = MockRuntime::new();

        // Open entry: node_modules/bar/index.js
        runtime
            .expect_open()
            .with(eq(PathBuf::from("node_modules/bar/index.js")))
            .returning(|_| Ok(Box::new(Cursor::new(b"export const bar = 1;\n".to_vec()))));

        let info = resolve(&runtime, candidate("bar", None)).unwrap();
        assert_eq!(
            info.resolved_version(),
            content_version(Cursor::new(b"export const bar = 1;\n")).unwrap()
        );
    }

    #[test]
    fn test_resolve_all_excludes_unreadable_entries() {
        let mut runtime = MockRuntime::new();

        runtime
            .expect_open()
            .with(eq(PathBuf::from("node_modules/gone/index.js")))
            .returning(|_| Err(anyhow::anyhow!("No such file or directory")));

        let registry = resolve_all(
            &runtime,
            vec![candidate("gone", None), candidate("kept", Some("3.0.0"))],
        );

        assert_eq!(registry.len(), 1);
        assert!(registry.get("gone").is_none());
        assert_eq!(registry.get("kept").unwrap().resolved_version(), "3.0.0");
    }
}
