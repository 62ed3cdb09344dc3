//! ICC Profile container
//!
//! An ICC profile consists of:
//! 1. A 128-byte header
//! 2. A tag table listing all tags
//! 3. Tag data, where several directory entries may point at the same bytes
//!
//! Entries that share an `(offset, size)` pair are read into one
//! [`SharedTag`], and a tag instance attached under several signatures is
//! written once.
//!
//! # Usage
//!
//! ```ignore
//! let profile = IccProfile::from_bytes(&bytes)?;
//! println!("Profile: {:?}", profile.description());
//! ```

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use std::rc::Rc;

use super::error::IccError;
use super::header::{ColorSpace, IccHeader, MIN_PROFILE_SIZE, ProfileClass, ProfileVersion};
use super::io::{IccReader, IccWriter};
use super::md5;
use super::registry::TagRegistry;
use super::tags::{LutCurve, SharedTag, Tag, TagData};
use super::types::{TagSignature, TypeSignature, signature_string};
use super::validate::{ValidationReport, ValidationStatus, validate_profile};
use crate::color::Xyz;
use crate::math::{Matrix3x3, chad_matrix};

/// Directory entry: tag signature plus the tag it points at
#[derive(Debug, Clone)]
pub struct TagEntry {
    pub signature: TagSignature,
    pub tag: SharedTag,
    /// Offset recorded by the last read or write
    pub offset: u32,
    /// Unpadded size recorded by the last read or write
    pub size: u32,
}

/// Accepted range of major versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionPolicy {
    pub min_major: u8,
    pub max_major: u8,
}

impl Default for VersionPolicy {
    fn default() -> Self {
        Self {
            min_major: 2,
            max_major: 4,
        }
    }
}

impl VersionPolicy {
    pub fn accepts(&self, version: ProfileVersion) -> bool {
        (self.min_major..=self.max_major).contains(&version.major)
    }
}

/// Options for [`IccProfile::read_with`]
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub version_policy: VersionPolicy,
    /// Fail on tag types no factory claims instead of keeping raw bytes
    pub strict_tag_types: bool,
}

impl ReadOptions {
    pub fn with_version_policy(mut self, policy: VersionPolicy) -> Self {
        self.version_policy = policy;
        self
    }

    pub fn with_strict_tag_types(mut self, strict: bool) -> Self {
        self.strict_tag_types = strict;
        self
    }
}

/// Options for [`IccProfile::write`]
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Force the header version
    pub version: Option<ProfileVersion>,
    /// Recompute the profile ID (only for version 4 and later)
    pub compute_id: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            version: None,
            compute_id: true,
        }
    }
}

impl WriteOptions {
    pub fn with_version(mut self, version: ProfileVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_compute_id(mut self, compute_id: bool) -> Self {
        self.compute_id = compute_id;
        self
    }
}

/// An ICC profile: header plus an ordered tag directory
#[derive(Debug, Clone)]
pub struct IccProfile {
    /// Profile header (128 bytes)
    pub header: IccHeader,
    entries: Vec<TagEntry>,
    /// Profile ID of the bytes last read or written, valid while the
    /// directory and header are untouched
    source_id: Option<SourceId>,
}

#[derive(Debug, Clone)]
struct SourceId {
    header: IccHeader,
    id: [u8; 16],
}

/// Serialized profile plus the directory layout it was written with
struct Encoded {
    bytes: Vec<u8>,
    layout: Vec<(u32, u32)>,
    version: ProfileVersion,
    /// Profile ID of `bytes`
    digest: [u8; 16],
}

const DIRECTORY_START: usize = MIN_PROFILE_SIZE + 4;
const DIRECTORY_ENTRY_SIZE: usize = 12;

impl IccProfile {
    /// Empty v4.3 profile with a D50 illuminant
    pub fn new(device_class: ProfileClass, color_space: ColorSpace, pcs: ColorSpace) -> Self {
        Self {
            header: IccHeader::new(device_class, color_space, pcs),
            entries: Vec::new(),
            source_id: None,
        }
    }

    /// Read a profile from the source's current position using the built-in tag types
    pub fn read<R: Read + Seek>(source: &mut R) -> Result<Self, IccError> {
        Self::read_with(source, TagRegistry::standard(), &ReadOptions::default())
    }

    /// Read a profile, resolving tag types through `registry`
    pub fn read_with<R: Read + Seek>(
        source: &mut R,
        registry: &TagRegistry,
        options: &ReadOptions,
    ) -> Result<Self, IccError> {
        let mut rd = IccReader::new(source)?;
        let base = rd.tell();
        let available = rd.remaining() as usize;

        let header = IccHeader::read(&mut rd)?;
        if !options.version_policy.accepts(header.version) {
            return Err(IccError::UnsupportedVersion {
                major: header.version.major,
                minor: header.version.minor,
            });
        }
        header.validate(available)?;
        let declared = header.size as usize;
        if declared < DIRECTORY_START {
            return Err(IccError::TooSmall {
                expected: DIRECTORY_START,
                actual: declared,
            });
        }

        let count = rd.read_u32()?;
        let directory_end = DIRECTORY_START as u64 + DIRECTORY_ENTRY_SIZE as u64 * count as u64;
        if directory_end > declared as u64 {
            return Err(IccError::DirectoryOverflow {
                count,
                profile_size: header.size,
            });
        }

        let mut directory = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let signature = rd.read_sig()?;
            let offset = rd.read_u32()?;
            let size = rd.read_u32()?;
            directory.push((signature, offset, size));
        }

        let mut entries: Vec<TagEntry> = Vec::with_capacity(directory.len());
        let mut loaded: HashMap<(u32, u32), SharedTag> = HashMap::new();
        for (signature, offset, size) in directory {
            let end = offset as u64 + size as u64;
            if end > declared as u64 || (size as usize) < 8 {
                return Err(IccError::TagOutOfBounds {
                    tag: signature,
                    offset,
                    size,
                    profile_size: declared,
                });
            }

            let tag = match loaded.get(&(offset, size)) {
                Some(existing) => {
                    tracing::trace!(tag = %TagSignature(signature), offset, "aliasing shared tag");
                    Rc::clone(existing)
                }
                None => {
                    rd.seek(base + offset as u64)?;
                    let bytes = rd.read_bytes(size as usize)?;
                    let type_sig =
                        TypeSignature(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
                    if options.strict_tag_types && !registry.is_supported(type_sig) {
                        return Err(IccError::UnsupportedTagType {
                            tag: signature,
                            type_sig: type_sig.0,
                        });
                    }

                    let mut cur = Cursor::new(bytes);
                    let mut tag_rd = IccReader::new(&mut cur)?;
                    let tag = Tag::read(&mut tag_rd, size as usize, registry)?.shared();
                    tracing::trace!(
                        tag = %TagSignature(signature),
                        type_sig = %type_sig,
                        offset,
                        size,
                        "read tag"
                    );
                    loaded.insert((offset, size), Rc::clone(&tag));
                    tag
                }
            };

            let signature = TagSignature(signature);
            if let Some(pos) = entries.iter().position(|e| e.signature == signature) {
                tracing::warn!(tag = %signature, "duplicate directory entry, keeping the last");
                entries.remove(pos);
            }
            entries.push(TagEntry {
                signature,
                tag,
                offset,
                size,
            });
        }

        // The stored ID covers the bytes as laid out in the source
        rd.seek(base)?;
        let raw = rd.read_bytes(declared)?;
        let source_id = SourceId {
            header: header.clone(),
            id: md5::profile_id(&raw),
        };

        tracing::debug!(
            version = %header.version,
            size = header.size,
            tags = entries.len(),
            shared = entries.len() - loaded.len(),
            "read ICC profile"
        );
        Ok(Self {
            header,
            entries,
            source_id: Some(source_id),
        })
    }

    /// Parse a profile held in memory
    pub fn from_bytes(data: &[u8]) -> Result<Self, IccError> {
        Self::read(&mut Cursor::new(data))
    }

    /// Read a profile file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IccError> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read(&mut reader)
    }

    /// Serialize into `sink`
    ///
    /// Updates the in-memory header (size, version, profile ID) and the
    /// recorded directory offsets to match what was written.
    pub fn write<W: Write>(&mut self, sink: &mut W, options: &WriteOptions) -> Result<(), IccError> {
        let encoded = self.encode(options)?;
        sink.write_all(&encoded.bytes)?;
        sink.flush()?;

        self.header.size = encoded.bytes.len() as u32;
        self.header.version = encoded.version;
        self.header
            .profile_id
            .copy_from_slice(&encoded.bytes[super::header::PROFILE_ID_RANGE]);
        for (entry, (offset, size)) in self.entries.iter_mut().zip(encoded.layout) {
            entry.offset = offset;
            entry.size = size;
        }
        self.source_id = Some(SourceId {
            header: self.header.clone(),
            id: encoded.digest,
        });
        Ok(())
    }

    /// Serialize to a byte vector; see [`write`](Self::write)
    pub fn to_bytes(&mut self, options: &WriteOptions) -> Result<Vec<u8>, IccError> {
        let mut out = Vec::new();
        self.write(&mut out, options)?;
        Ok(out)
    }

    /// Write to a file with default options
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), IccError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer, &WriteOptions::default())
    }

    /// MD5 profile ID of the current content
    ///
    /// Serializes without touching `self`; the stored ID does not take part.
    pub fn compute_fingerprint(&self) -> Result<[u8; 16], IccError> {
        let encoded = self.encode(&WriteOptions::default().with_compute_id(false))?;
        Ok(encoded.digest)
    }

    /// Profile ID the stored header ID should equal
    ///
    /// For a profile that has not been changed since it was read or written
    /// this is the digest of those exact bytes, whatever their layout;
    /// otherwise it is [`compute_fingerprint`](Self::compute_fingerprint).
    /// Edits made in place through a [`SharedTag`] are not tracked.
    pub fn content_id(&self) -> Result<[u8; 16], IccError> {
        match &self.source_id {
            Some(source) if source.header == self.header => Ok(source.id),
            _ => self.compute_fingerprint(),
        }
    }

    fn encode(&self, options: &WriteOptions) -> Result<Encoded, IccError> {
        let mut header = self.header.clone();
        if let Some(version) = options.version {
            header.version = version;
        }

        let mut cur = Cursor::new(Vec::new());
        let mut layout: Vec<(u32, u32)> = Vec::with_capacity(self.entries.len());
        {
            let mut wr = IccWriter::new(&mut cur)?;
            // Header and directory are patched once the layout is known
            wr.write_bytes(&[0u8; MIN_PROFILE_SIZE])?;
            wr.write_u32(self.entries.len() as u32)?;
            wr.write_bytes(&vec![0u8; DIRECTORY_ENTRY_SIZE * self.entries.len()])?;

            for (i, entry) in self.entries.iter().enumerate() {
                let earlier = self.entries[..i]
                    .iter()
                    .position(|e| Rc::ptr_eq(&e.tag, &entry.tag));
                if let Some(j) = earlier {
                    layout.push(layout[j]);
                    continue;
                }
                let start = wr.tell();
                entry.tag.borrow().write(&mut wr)?;
                let size = wr.tell() - start;
                wr.align(4)?;
                tracing::trace!(tag = %entry.signature, offset = start, size, "wrote tag");
                layout.push((start as u32, size as u32));
            }

            let total = wr.tell();
            header.size = total as u32;

            wr.seek(DIRECTORY_START as u64)?;
            for (entry, &(offset, size)) in self.entries.iter().zip(&layout) {
                wr.write_sig(entry.signature.0)?;
                wr.write_u32(offset)?;
                wr.write_u32(size)?;
            }

            if options.compute_id && header.version.major >= 4 {
                header.profile_id = [0; 16];
            }
            wr.seek(0)?;
            header.write(&mut wr)?;
            wr.seek(total)?;
            wr.flush()?;
        }

        let mut bytes = cur.into_inner();
        let digest = md5::profile_id(&bytes);
        if options.compute_id && header.version.major >= 4 {
            bytes[super::header::PROFILE_ID_RANGE].copy_from_slice(&digest);
        } else if header.has_profile_id() && header.profile_id != digest {
            // A kept ID must still describe the content
            tracing::debug!("dropping stale profile ID");
            bytes[super::header::PROFILE_ID_RANGE].fill(0);
        }
        tracing::debug!(
            size = bytes.len(),
            tags = self.entries.len(),
            version = %header.version,
            "encoded ICC profile"
        );
        Ok(Encoded {
            bytes,
            layout,
            version: header.version,
            digest,
        })
    }

    /// Attach `tag` under `sig`, replacing any tag already there
    pub fn attach_tag(&mut self, sig: TagSignature, tag: impl Into<Tag>) -> SharedTag {
        let shared = tag.into().shared();
        self.attach_shared(sig, Rc::clone(&shared));
        shared
    }

    /// Attach an existing handle, so that `sig` aliases every other holder of it
    pub fn attach_shared(&mut self, sig: TagSignature, tag: SharedTag) {
        self.source_id = None;
        match self.entries.iter_mut().find(|e| e.signature == sig) {
            Some(entry) => {
                entry.tag = tag;
                entry.offset = 0;
                entry.size = 0;
            }
            None => self.entries.push(TagEntry {
                signature: sig,
                tag,
                offset: 0,
                size: 0,
            }),
        }
    }

    /// Remove `sig` from the directory; other aliases of the tag stay attached
    pub fn detach_tag(&mut self, sig: TagSignature) -> Option<SharedTag> {
        let pos = self.entries.iter().position(|e| e.signature == sig)?;
        self.source_id = None;
        Some(self.entries.remove(pos).tag)
    }

    /// Handle to the tag under `sig`
    pub fn get_tag(&self, sig: TagSignature) -> Option<SharedTag> {
        self.entry(sig).map(|e| Rc::clone(&e.tag))
    }

    pub fn entry(&self, sig: TagSignature) -> Option<&TagEntry> {
        self.entries.iter().find(|e| e.signature == sig)
    }

    pub fn entries(&self) -> &[TagEntry] {
        &self.entries
    }

    pub fn has_tag(&self, sig: TagSignature) -> bool {
        self.entry(sig).is_some()
    }

    /// Whether both signatures point at the same tag instance
    pub fn are_shared(&self, a: TagSignature, b: TagSignature) -> bool {
        match (self.entry(a), self.entry(b)) {
            (Some(x), Some(y)) => Rc::ptr_eq(&x.tag, &y.tag),
            _ => false,
        }
    }

    /// Tag signatures in directory order
    pub fn tag_signatures(&self) -> impl Iterator<Item = TagSignature> + '_ {
        self.entries.iter().map(|e| e.signature)
    }

    /// Get number of tags
    pub fn tag_count(&self) -> usize {
        self.entries.len()
    }

    /// Apply `f` to the body under `sig`
    pub fn with_tag<T>(&self, sig: TagSignature, f: impl FnOnce(&TagData) -> Option<T>) -> Option<T> {
        let entry = self.entry(sig)?;
        let tag = entry.tag.borrow();
        f(&tag.data)
    }

    /// Check header, required tags and every tag body
    pub fn validate(&self) -> (ValidationStatus, ValidationReport) {
        let report = validate_profile(self);
        (report.status(), report)
    }

    /// Get profile description
    pub fn description(&self) -> Option<String> {
        self.with_tag(TagSignature::DESC, |t| t.as_text().map(str::to_string))
    }

    /// Get copyright text
    pub fn copyright(&self) -> Option<String> {
        self.with_tag(TagSignature::COPYRIGHT, |t| t.as_text().map(str::to_string))
    }

    fn xyz_tag(&self, sig: TagSignature) -> Option<Xyz> {
        self.with_tag(sig, TagData::xyz_value)
    }

    /// Get red colorant XYZ
    pub fn red_colorant(&self) -> Option<Xyz> {
        self.xyz_tag(TagSignature::RED_COLORANT)
    }

    /// Get green colorant XYZ
    pub fn green_colorant(&self) -> Option<Xyz> {
        self.xyz_tag(TagSignature::GREEN_COLORANT)
    }

    /// Get blue colorant XYZ
    pub fn blue_colorant(&self) -> Option<Xyz> {
        self.xyz_tag(TagSignature::BLUE_COLORANT)
    }

    /// Get media white point
    pub fn media_white_point(&self) -> Option<Xyz> {
        self.xyz_tag(TagSignature::MEDIA_WHITE)
    }

    /// Get media black point (bkpt tag)
    pub fn media_black_point(&self) -> Option<Xyz> {
        self.xyz_tag(TagSignature::MEDIA_BLACK)
    }

    fn trc(&self, sig: TagSignature) -> Option<LutCurve> {
        self.with_tag(sig, TagData::as_lut_curve)
    }

    /// Get red TRC (tone reproduction curve)
    pub fn red_trc(&self) -> Option<LutCurve> {
        self.trc(TagSignature::RED_TRC)
    }

    /// Get green TRC
    pub fn green_trc(&self) -> Option<LutCurve> {
        self.trc(TagSignature::GREEN_TRC)
    }

    /// Get blue TRC
    pub fn blue_trc(&self) -> Option<LutCurve> {
        self.trc(TagSignature::BLUE_TRC)
    }

    /// Get gray TRC (for monochrome profiles)
    pub fn gray_trc(&self) -> Option<LutCurve> {
        self.trc(TagSignature::GRAY_TRC)
    }

    /// Get chromatic adaptation matrix (chad tag)
    pub fn chromatic_adaptation_matrix(&self) -> Option<Matrix3x3> {
        self.with_tag(TagSignature::CHAD, chad_matrix)
    }

    /// Check if this is a matrix-shaper profile (has colorants + TRCs)
    pub fn is_matrix_shaper(&self) -> bool {
        if !self.header.is_matrix_shaper() {
            return false;
        }
        match self.header.color_space {
            ColorSpace::Gray => self.has_tag(TagSignature::GRAY_TRC),
            _ => [
                TagSignature::RED_COLORANT,
                TagSignature::GREEN_COLORANT,
                TagSignature::BLUE_COLORANT,
                TagSignature::RED_TRC,
                TagSignature::GREEN_TRC,
                TagSignature::BLUE_TRC,
            ]
            .into_iter()
            .all(|sig| self.has_tag(sig)),
        }
    }

    /// Check if this is a LUT-based profile
    pub fn is_lut_based(&self) -> bool {
        [
            TagSignature::A2B0,
            TagSignature::B2A0,
            TagSignature::D2B0,
            TagSignature::B2D0,
        ]
        .into_iter()
        .any(|sig| self.has_tag(sig))
    }

    /// Get the number of device channels for this profile
    pub fn input_channels(&self) -> usize {
        self.header.color_space.channels()
    }

    /// Get the number of PCS channels
    pub fn pcs_channels(&self) -> usize {
        self.header.pcs.channels()
    }

    /// Text dump of the header followed by every tag
    pub fn describe(&self) -> String {
        let h = &self.header;
        let mut out = String::new();
        let _ = writeln!(out, "Size:            {}", h.size);
        let _ = writeln!(out, "Preferred CMM:   '{}'", signature_string(h.cmm_type));
        let _ = writeln!(out, "Version:         {}", h.version);
        let _ = writeln!(out, "Device class:    {:?}", h.device_class);
        let _ = writeln!(out, "Color space:     {:?}", h.color_space);
        let _ = writeln!(out, "PCS:             {:?}", h.pcs);
        let _ = writeln!(out, "Created:         {}", h.creation_date);
        let _ = writeln!(out, "Platform:        '{}'", signature_string(h.platform));
        let _ = writeln!(out, "Flags:           0x{:08X}", h.flags);
        let _ = writeln!(out, "Manufacturer:    '{}'", signature_string(h.manufacturer));
        let _ = writeln!(out, "Model:           '{}'", signature_string(h.model));
        let _ = writeln!(out, "Attributes:      0x{:016X}", h.attributes);
        let _ = writeln!(out, "Intent:          {}", h.rendering_intent);
        let illum = h.illuminant.to_xyz();
        let _ = writeln!(
            out,
            "Illuminant:      X={:.4} Y={:.4} Z={:.4}",
            illum.x, illum.y, illum.z
        );
        let _ = writeln!(out, "Creator:         '{}'", signature_string(h.creator));
        let _ = writeln!(out, "Profile ID:      {}", md5::to_hex(&h.profile_id));
        let _ = writeln!(out, "Tags:            {}", self.entries.len());

        for (i, entry) in self.entries.iter().enumerate() {
            let tag = entry.tag.borrow();
            let _ = write!(
                out,
                "\n'{}' ({}) offset {} size {}",
                entry.signature,
                tag.type_signature(),
                entry.offset,
                entry.size
            );
            if let Some(first) = self.entries[..i]
                .iter()
                .find(|e| Rc::ptr_eq(&e.tag, &entry.tag))
            {
                let _ = writeln!(out, ", shared with '{}'", first.signature);
                continue;
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", tag.data.describe());
        }
        out
    }
}
