//! Profile validation
//!
//! Validation never fails: every check appends a [`Finding`] and the report's
//! status is the worst one seen.

use std::fmt;

use super::header::{ColorSpace, ProfileClass};
use super::profile::IccProfile;
use super::tags::TagData;
use super::types::{TagSignature, TypeSignature};
use crate::color::D50;

/// Severity, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ValidationStatus {
    #[default]
    Ok,
    Warning,
    NonCompliant,
    CriticalError,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::NonCompliant => "non-compliant",
            Self::CriticalError => "critical",
        };
        f.write_str(s)
    }
}

/// One validation message
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub status: ValidationStatus,
    pub tag: Option<TagSignature>,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            Some(tag) => write!(f, "[{}] '{}': {}", self.status, tag, self.message),
            None => write!(f, "[{}] {}", self.status, self.message),
        }
    }
}

/// Accumulated findings
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn push(&mut self, status: ValidationStatus, tag: Option<TagSignature>, message: impl Into<String>) {
        self.findings.push(Finding {
            status,
            tag,
            message: message.into(),
        });
    }

    pub fn warning(&mut self, tag: Option<TagSignature>, message: impl Into<String>) {
        self.push(ValidationStatus::Warning, tag, message);
    }

    pub fn non_compliant(&mut self, tag: Option<TagSignature>, message: impl Into<String>) {
        self.push(ValidationStatus::NonCompliant, tag, message);
    }

    pub fn critical(&mut self, tag: Option<TagSignature>, message: impl Into<String>) {
        self.push(ValidationStatus::CriticalError, tag, message);
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Worst status among the findings
    pub fn status(&self) -> ValidationStatus {
        self.findings
            .iter()
            .map(|f| f.status)
            .max()
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Findings attached to `tag`
    pub fn for_tag(&self, tag: TagSignature) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(move |f| f.tag == Some(tag))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in &self.findings {
            writeln!(f, "{}", finding)?;
        }
        Ok(())
    }
}

/// Run every check against `profile`
pub fn validate_profile(profile: &IccProfile) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_header(profile, &mut report);
    check_required_tags(profile, &mut report);

    let header = &profile.header;
    for entry in profile.entries() {
        let tag = entry.tag.borrow();
        let type_sig = tag.type_signature();

        match allowed_types(entry.signature) {
            Some(allowed) if !tag.data.is_unknown() && !allowed.contains(&type_sig) => {
                report.non_compliant(
                    Some(entry.signature),
                    format!("type '{}' is not allowed for this tag", type_sig),
                );
            }
            _ => {}
        }

        tag.data.validate(entry.signature, header, &mut report);
        check_transform_channels(profile, entry.signature, &tag.data, &mut report);
    }

    tracing::debug!(
        status = %report.status(),
        findings = report.findings().len(),
        "validated profile"
    );
    report
}

fn check_header(profile: &IccProfile, report: &mut ValidationReport) {
    let header = &profile.header;

    if !(2..=5).contains(&header.version.major) {
        report.non_compliant(None, format!("unrecognized version {}", header.version));
    }
    if header.device_class != ProfileClass::DeviceLink && !header.pcs.is_pcs() {
        report.non_compliant(
            None,
            format!("PCS must be XYZ or Lab, found {:?}", header.pcs),
        );
    }
    if header.intent().is_err() {
        report.non_compliant(
            None,
            format!("rendering intent {} is out of range", header.rendering_intent),
        );
    }

    let illum = header.illuminant.to_xyz();
    if !illum.approx_eq(&D50.xyz, 0.001) {
        report.warning(
            None,
            format!(
                "illuminant X={:.4} Y={:.4} Z={:.4} is not D50",
                illum.x, illum.y, illum.z
            ),
        );
    }
    if header.size % 4 != 0 {
        report.warning(None, format!("profile size {} is not a multiple of 4", header.size));
    }

    if header.has_profile_id() {
        match profile.content_id() {
            Ok(id) if id != header.profile_id => {
                report.warning(None, "profile ID does not match the content");
            }
            Ok(_) => {}
            Err(e) => report.warning(None, format!("cannot compute profile ID: {}", e)),
        }
    }
}

const RGB_MATRIX_TRC: [TagSignature; 6] = [
    TagSignature::RED_COLORANT,
    TagSignature::GREEN_COLORANT,
    TagSignature::BLUE_COLORANT,
    TagSignature::RED_TRC,
    TagSignature::GREEN_TRC,
    TagSignature::BLUE_TRC,
];

fn check_required_tags(profile: &IccProfile, report: &mut ValidationReport) {
    let header = &profile.header;
    let require = |sig: TagSignature, report: &mut ValidationReport| {
        if !profile.has_tag(sig) {
            report.non_compliant(Some(sig), "required tag is missing");
        }
    };

    if header.device_class != ProfileClass::DeviceLink {
        for sig in [
            TagSignature::DESC,
            TagSignature::COPYRIGHT,
            TagSignature::MEDIA_WHITE,
        ] {
            require(sig, report);
        }
    }

    match header.device_class {
        ProfileClass::Input | ProfileClass::Display => {
            if profile.has_tag(TagSignature::A2B0) {
                return;
            }
            match header.color_space {
                ColorSpace::Gray => require(TagSignature::GRAY_TRC, report),
                ColorSpace::Rgb => {
                    for sig in RGB_MATRIX_TRC {
                        require(sig, report);
                    }
                }
                other => {
                    report.non_compliant(
                        Some(TagSignature::A2B0),
                        format!("{:?} device without an A2B0 transform", other),
                    );
                }
            }
        }
        ProfileClass::Output => {
            for sig in [
                TagSignature::A2B0,
                TagSignature::A2B1,
                TagSignature::A2B2,
                TagSignature::B2A0,
                TagSignature::B2A1,
                TagSignature::B2A2,
                TagSignature::GAMUT,
            ] {
                require(sig, report);
            }
        }
        ProfileClass::DeviceLink => {
            require(TagSignature::A2B0, report);
            require(TagSignature::PROFILE_SEQUENCE, report);
        }
        ProfileClass::ColorSpace => {
            require(TagSignature::A2B0, report);
            require(TagSignature::B2A0, report);
        }
        ProfileClass::Abstract => require(TagSignature::A2B0, report),
        ProfileClass::NamedColor => require(TagSignature::NAMED_COLOR2, report),
    }
}

const LUT_TYPES: &[TypeSignature] = &[
    TypeSignature::LUT8,
    TypeSignature::LUT16,
    TypeSignature::LUTA2B,
];
const LUT_B2A_TYPES: &[TypeSignature] = &[
    TypeSignature::LUT8,
    TypeSignature::LUT16,
    TypeSignature::LUTB2A,
];
const CURVE_TYPES: &[TypeSignature] = &[TypeSignature::CURVE, TypeSignature::PARA];
const TEXT_TYPES: &[TypeSignature] = &[
    TypeSignature::TEXT,
    TypeSignature::DESC,
    TypeSignature::MLUC,
];

/// Type signatures a tag may use; None when the tag is not restricted
fn allowed_types(sig: TagSignature) -> Option<&'static [TypeSignature]> {
    Some(match sig {
        TagSignature::A2B0 | TagSignature::A2B1 | TagSignature::A2B2 => LUT_TYPES,
        TagSignature::B2A0
        | TagSignature::B2A1
        | TagSignature::B2A2
        | TagSignature::GAMUT
        | TagSignature::PREVIEW0
        | TagSignature::PREVIEW1
        | TagSignature::PREVIEW2 => LUT_B2A_TYPES,
        TagSignature::D2B0
        | TagSignature::D2B1
        | TagSignature::D2B2
        | TagSignature::D2B3
        | TagSignature::B2D0
        | TagSignature::B2D1
        | TagSignature::B2D2
        | TagSignature::B2D3 => &[TypeSignature::MPET],
        TagSignature::RED_COLORANT
        | TagSignature::GREEN_COLORANT
        | TagSignature::BLUE_COLORANT
        | TagSignature::MEDIA_WHITE
        | TagSignature::MEDIA_BLACK
        | TagSignature::LUMINANCE => &[TypeSignature::XYZ],
        TagSignature::RED_TRC
        | TagSignature::GREEN_TRC
        | TagSignature::BLUE_TRC
        | TagSignature::GRAY_TRC => CURVE_TYPES,
        TagSignature::DESC
        | TagSignature::COPYRIGHT
        | TagSignature::DMND
        | TagSignature::DMDD
        | TagSignature::VIEW_COND_DESC
        | TagSignature::CHAR_TARGET => TEXT_TYPES,
        TagSignature::CHAD => &[TypeSignature::SF32],
        TagSignature::CALIBRATION_DATE => &[TypeSignature::DTIM],
        TagSignature::TECH => &[TypeSignature::SIG],
        TagSignature::MEASUREMENT => &[TypeSignature::MEAS],
        TagSignature::COLORANT_TABLE | TagSignature::COLORANT_TABLE_OUT => &[TypeSignature::CLRT],
        TagSignature::NAMED_COLOR2 => &[TypeSignature::NCL2],
        _ => return None,
    })
}

/// Expected (input, output) channels of a transform tag
fn transform_channels(profile: &IccProfile, sig: TagSignature) -> Option<(usize, usize)> {
    let header = &profile.header;
    let device = header.color_space.channels();
    let pcs = header.pcs.channels();
    let forward = matches!(
        sig,
        TagSignature::A2B0
            | TagSignature::A2B1
            | TagSignature::A2B2
            | TagSignature::D2B0
            | TagSignature::D2B1
            | TagSignature::D2B2
            | TagSignature::D2B3
    );
    let backward = matches!(
        sig,
        TagSignature::B2A0
            | TagSignature::B2A1
            | TagSignature::B2A2
            | TagSignature::B2D0
            | TagSignature::B2D1
            | TagSignature::B2D2
            | TagSignature::B2D3
    );
    if forward {
        Some((device, pcs))
    } else if backward {
        Some((pcs, device))
    } else if sig == TagSignature::GAMUT {
        Some((pcs, 1))
    } else {
        None
    }
}

fn check_transform_channels(
    profile: &IccProfile,
    sig: TagSignature,
    data: &TagData,
    report: &mut ValidationReport,
) {
    let Some((inputs, outputs)) = transform_channels(profile, sig) else {
        return;
    };
    let actual = match data {
        TagData::MultiProcessElement(m) => (m.input_channels, m.output_channels),
        other => match other.as_mbb(false) {
            Some(mbb) => (mbb.input_channels, mbb.output_channels),
            None => return,
        },
    };
    if actual != (inputs, outputs) {
        report.critical(
            Some(sig),
            format!(
                "transform maps {} to {} channels, header color spaces need {} to {}",
                actual.0, actual.1, inputs, outputs
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clut::{Clut, ClutPrecision};
    use crate::color::Xyz;
    use crate::icc::tags::{CurveData, Lut16Data, MlucData, XyzTagData, identity_table};

    fn display_profile() -> IccProfile {
        let mut profile = IccProfile::new(ProfileClass::Display, ColorSpace::Gray, ColorSpace::Xyz);
        profile.attach_tag(
            TagSignature::DESC,
            TagData::MultiLocalizedUnicode(MlucData::english("Gray")),
        );
        profile.attach_tag(
            TagSignature::COPYRIGHT,
            TagData::MultiLocalizedUnicode(MlucData::english("No copyright")),
        );
        profile.attach_tag(
            TagSignature::MEDIA_WHITE,
            TagData::Xyz(XyzTagData::new(D50.xyz)),
        );
        profile.attach_tag(TagSignature::GRAY_TRC, TagData::Curve(CurveData::gamma(2.2)));
        profile
    }

    #[test]
    fn test_valid_profile_is_ok() {
        let (status, report) = display_profile().validate();
        assert_eq!(status, ValidationStatus::Ok, "{}", report);
        assert!(report.is_empty());
    }

    #[test]
    fn test_missing_required_tag() {
        let mut profile = display_profile();
        profile.detach_tag(TagSignature::COPYRIGHT);
        let (status, report) = profile.validate();
        assert_eq!(status, ValidationStatus::NonCompliant);
        assert_eq!(report.for_tag(TagSignature::COPYRIGHT).count(), 1);
        assert!(report.to_string().contains("'cprt': required tag is missing"));
    }

    #[test]
    fn test_wrong_tag_type() {
        let mut profile = display_profile();
        profile.attach_tag(TagSignature::MEDIA_WHITE, TagData::Text("white".into()));
        let (status, report) = profile.validate();
        assert_eq!(status, ValidationStatus::NonCompliant);
        assert!(report.for_tag(TagSignature::MEDIA_WHITE).count() >= 1);
    }

    #[test]
    fn test_header_warnings() {
        let mut profile = display_profile();
        profile.header.illuminant = crate::icc::types::XyzNumber::from_xyz(Xyz::new(0.95, 1.0, 1.09));
        profile.header.profile_id = [1; 16];
        let (status, report) = profile.validate();
        assert_eq!(status, ValidationStatus::Warning);
        assert_eq!(report.findings().len(), 2);

        profile.header.rendering_intent = 9;
        assert_eq!(profile.validate().0, ValidationStatus::NonCompliant);
    }

    #[test]
    fn test_matching_profile_id_passes() {
        let mut profile = display_profile();
        profile.header.profile_id = profile.compute_fingerprint().unwrap();
        assert_eq!(profile.validate().0, ValidationStatus::Ok);
    }

    #[test]
    fn test_lut_channel_mismatch_is_critical() {
        let mut profile = IccProfile::new(ProfileClass::Output, ColorSpace::Cmyk, ColorSpace::Lab);
        // 3-in lut in a 4-channel profile
        let lut = Lut16Data::new(
            vec![identity_table(2); 3],
            Clut::new(&[2, 2, 2], 3, ClutPrecision::U16).unwrap(),
            vec![identity_table(2); 3],
        )
        .unwrap();
        profile.attach_tag(TagSignature::A2B0, TagData::Lut16(lut));
        let (status, report) = profile.validate();
        assert_eq!(status, ValidationStatus::CriticalError);
        assert!(
            report
                .for_tag(TagSignature::A2B0)
                .any(|f| f.status == ValidationStatus::CriticalError)
        );
        // the remaining output tags are reported as missing
        assert!(report.for_tag(TagSignature::GAMUT).count() == 1);
    }

    #[test]
    fn test_unknown_type_warns() {
        let mut profile = display_profile();
        profile.attach_tag(
            TagSignature::from_bytes(*b"zzzz"),
            TagData::Unknown {
                type_sig: 0x7A7A7A7A,
                data: vec![1, 2, 3],
            },
        );
        assert_eq!(profile.validate().0, ValidationStatus::Warning);
    }

    #[test]
    fn test_status_order() {
        assert!(ValidationStatus::Ok < ValidationStatus::Warning);
        assert!(ValidationStatus::Warning < ValidationStatus::NonCompliant);
        assert!(ValidationStatus::NonCompliant < ValidationStatus::CriticalError);
        assert_eq!(ValidationReport::default().status(), ValidationStatus::Ok);
    }
}
