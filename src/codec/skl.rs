// src/codec/skl.rs

//! The `.skl` skeleton codec
//!
//! Reads the legacy skeleton container (`r3d2sklt`, revisions 1 and 2,
//! storing per-joint model-space matrices) as well as the current revision
//! (token header, offset table, per-joint local + inverse-model-space
//! transforms), and always writes the current revision. Bone data is
//! carried mechanically; nothing here interprets it beyond the layout.

use super::{CodecError, Joint, Skeleton, SkeletonCodec, Transform};

/// Magic of the legacy container
const LEGACY_MAGIC: [u8; 8] = *b"r3d2sklt";

/// Format token of the current revision (sits where the legacy magic's
/// second word would be, so the two layouts cannot be confused)
const FORMAT_TOKEN: u32 = 0x22FD_4FC3;

/// Current revision number
const CURRENT_VERSION: u32 = 0;

const HEADER_SIZE: usize = 64;
const JOINT_SIZE: usize = 100;
const JOINT_INDEX_SIZE: usize = 8;
const LEGACY_JOINT_SIZE: usize = 88;
const LEGACY_NAME_SIZE: usize = 32;

/// Default joint radius when the source revision stores none
const DEFAULT_RADIUS: f32 = 2.1;

/// The concrete `.skl` codec
#[derive(Debug, Default)]
pub struct SklCodec;

impl SklCodec {
    pub fn new() -> Self {
        Self
    }

    fn decode_legacy(&self, data: &[u8]) -> Result<Skeleton, CodecError> {
        let mut reader = Reader::new(data);
        reader.take(LEGACY_MAGIC.len())?;
        let version = reader.u32()?;
        if !(1..=2).contains(&version) {
            return Err(CodecError::UnsupportedVersion(version));
        }
        let _skeleton_id = reader.u32()?;
        let joint_count = reader.u32()? as usize;
        if joint_count > i16::MAX as usize {
            return Err(CodecError::Malformed(format!(
                "implausible joint count {joint_count}"
            )));
        }

        let mut names = Vec::with_capacity(joint_count);
        let mut parents = Vec::with_capacity(joint_count);
        let mut globals = Vec::with_capacity(joint_count);
        for index in 0..joint_count {
            let record = reader.take(LEGACY_JOINT_SIZE)?;
            let name = nul_terminated(&record[..LEGACY_NAME_SIZE]);
            let parent = i32::from_le_bytes(record[32..36].try_into().unwrap());
            if parent != -1 && !(0..index as i32).contains(&parent) {
                return Err(CodecError::Malformed(format!(
                    "joint {index}: parent {parent} out of range"
                )));
            }
            // record[36..40] is the legacy per-joint scale, already folded
            // into the matrix by every known writer
            let mut matrix = [0f32; 12];
            for (i, m) in matrix.iter_mut().enumerate() {
                let at = 40 + i * 4;
                *m = f32::from_le_bytes(record[at..at + 4].try_into().unwrap());
            }
            names.push(name);
            parents.push(parent as i16);
            globals.push(matrix);
        }

        let influences = if version == 2 {
            let influence_count = reader.u32()? as usize;
            let mut influences = Vec::with_capacity(influence_count);
            for _ in 0..influence_count {
                let index = reader.u32()?;
                if index as usize >= joint_count {
                    return Err(CodecError::Malformed(format!(
                        "influence index {index} out of range"
                    )));
                }
                influences.push(index as u16);
            }
            influences
        } else {
            (0..joint_count as u16).collect()
        };

        let mut joints = Vec::with_capacity(joint_count);
        for index in 0..joint_count {
            let global = globals[index];
            let local = match parents[index] {
                -1 => global,
                parent => {
                    let inverse_parent = invert(&globals[parent as usize]).ok_or_else(|| {
                        CodecError::Malformed(format!("joint {parent}: singular transform"))
                    })?;
                    multiply(&inverse_parent, &global)
                }
            };
            let inverse_global = invert(&global).ok_or_else(|| {
                CodecError::Malformed(format!("joint {index}: singular transform"))
            })?;
            joints.push(Joint {
                name: names[index].clone(),
                parent: parents[index],
                radius: DEFAULT_RADIUS,
                local: decompose(&local),
                inverse_global: decompose(&inverse_global),
            });
        }

        Ok(Skeleton {
            name: String::new(),
            joints,
            influences,
        })
    }

    fn decode_current(&self, data: &[u8]) -> Result<Skeleton, CodecError> {
        let mut reader = Reader::new(data);
        let file_size = reader.u32()? as usize;
        if file_size != data.len() {
            return Err(CodecError::Malformed(format!(
                "declared size {file_size} != actual size {}",
                data.len()
            )));
        }
        let token = reader.u32()?;
        debug_assert_eq!(token, FORMAT_TOKEN);
        let version = reader.u32()?;
        if version != CURRENT_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        let _flags = reader.u16()?;
        let joint_count = reader.u16()? as usize;
        let influence_count = reader.u32()? as usize;
        let joints_offset = reader.u32()? as usize;
        let _joint_indices_offset = reader.u32()?;
        let influences_offset = reader.u32()? as usize;
        let name_offset = reader.u32()? as usize;

        let name = string_at(data, name_offset)?;

        let mut joints = Vec::with_capacity(joint_count);
        for index in 0..joint_count {
            let at = joints_offset + index * JOINT_SIZE;
            let record = slice_at(data, at, JOINT_SIZE)?;
            let mut r = Reader::new(record);
            let _flags = r.u16()?;
            let _id = r.i16()?;
            let parent = r.i16()?;
            let _pad = r.u16()?;
            let _name_hash = r.u32()?;
            let radius = r.f32()?;
            let local = r.transform()?;
            let inverse_global = r.transform()?;
            let joint_name_offset = r.u32()? as usize;
            joints.push(Joint {
                name: string_at(data, joint_name_offset)?,
                parent,
                radius,
                local,
                inverse_global,
            });
        }

        let mut influences = Vec::with_capacity(influence_count);
        let raw = slice_at(data, influences_offset, influence_count * 2)?;
        for chunk in raw.chunks_exact(2) {
            influences.push(u16::from_le_bytes(chunk.try_into().unwrap()));
        }

        Ok(Skeleton {
            name,
            joints,
            influences,
        })
    }
}

impl SkeletonCodec for SklCodec {
    fn decode(&self, data: &[u8]) -> Result<Skeleton, CodecError> {
        if data.len() >= LEGACY_MAGIC.len() && data[..LEGACY_MAGIC.len()] == LEGACY_MAGIC {
            return self.decode_legacy(data);
        }
        if data.len() >= 8 {
            let token = u32::from_le_bytes(data[4..8].try_into().unwrap());
            if token == FORMAT_TOKEN {
                return self.decode_current(data);
            }
        }
        Err(CodecError::BadMagic)
    }

    fn encode(&self, skeleton: &Skeleton) -> Result<Vec<u8>, CodecError> {
        let joint_count = skeleton.joints.len();
        if joint_count > u16::MAX as usize {
            return Err(CodecError::Malformed(format!(
                "too many joints to encode: {joint_count}"
            )));
        }

        let joints_offset = HEADER_SIZE;
        let joint_indices_offset = joints_offset + joint_count * JOINT_SIZE;
        let influences_offset = joint_indices_offset + joint_count * JOINT_INDEX_SIZE;
        let name_offset = influences_offset + skeleton.influences.len() * 2;
        let joint_names_offset = name_offset + skeleton.name.len() + 1;

        // Joint name blob offsets, before anything is written
        let mut joint_name_offsets = Vec::with_capacity(joint_count);
        let mut next = joint_names_offset;
        for joint in &skeleton.joints {
            joint_name_offsets.push(next);
            next += joint.name.len() + 1;
        }
        let file_size = next;

        let mut out = Vec::with_capacity(file_size);
        push_u32(&mut out, file_size as u32);
        push_u32(&mut out, FORMAT_TOKEN);
        push_u32(&mut out, CURRENT_VERSION);
        push_u16(&mut out, 0); // flags
        push_u16(&mut out, joint_count as u16);
        push_u32(&mut out, skeleton.influences.len() as u32);
        push_u32(&mut out, joints_offset as u32);
        push_u32(&mut out, joint_indices_offset as u32);
        push_u32(&mut out, influences_offset as u32);
        push_u32(&mut out, name_offset as u32);
        push_u32(&mut out, joint_names_offset as u32);
        out.extend_from_slice(&[0u8; 24]); // reserved

        for (index, joint) in skeleton.joints.iter().enumerate() {
            push_u16(&mut out, 0); // flags
            push_i16(&mut out, index as i16);
            push_i16(&mut out, joint.parent);
            push_u16(&mut out, 0); // pad
            push_u32(&mut out, elf_hash(&joint.name));
            push_f32(&mut out, joint.radius);
            push_transform(&mut out, &joint.local);
            push_transform(&mut out, &joint.inverse_global);
            push_u32(&mut out, joint_name_offsets[index] as u32);
        }

        for (index, joint) in skeleton.joints.iter().enumerate() {
            push_i16(&mut out, index as i16);
            push_u16(&mut out, 0);
            push_u32(&mut out, elf_hash(&joint.name));
        }

        for influence in &skeleton.influences {
            push_u16(&mut out, *influence);
        }

        out.extend_from_slice(skeleton.name.as_bytes());
        out.push(0);
        for joint in &skeleton.joints {
            out.extend_from_slice(joint.name.as_bytes());
            out.push(0);
        }

        debug_assert_eq!(out.len(), file_size);
        Ok(out)
    }
}

/// Elf hash over the lowercased name, the identifier scheme joint names use
fn elf_hash(name: &str) -> u32 {
    let mut hash: u32 = 0;
    for byte in name.to_lowercase().bytes() {
        hash = (hash << 4).wrapping_add(u32::from(byte));
        let high = hash & 0xF000_0000;
        if high != 0 {
            hash ^= high >> 24;
        }
        hash &= !high;
    }
    hash
}

// ---------------------------------------------------------------------------
// Affine transform plumbing. Matrices are 3x4 row-major (rows of the upper
// part of a 4x4 with implicit [0 0 0 1] bottom row), column-vector
// convention: column 3 is the translation.

type Mat34 = [f32; 12];

fn multiply(a: &Mat34, b: &Mat34) -> Mat34 {
    let mut out = [0f32; 12];
    for row in 0..3 {
        for col in 0..4 {
            let mut v = a[row * 4] * b[col]
                + a[row * 4 + 1] * b[4 + col]
                + a[row * 4 + 2] * b[8 + col];
            if col == 3 {
                v += a[row * 4 + 3];
            }
            out[row * 4 + col] = v;
        }
    }
    out
}

/// Invert an affine transform via the 3x3 adjugate; `None` when singular
fn invert(m: &Mat34) -> Option<Mat34> {
    let (a, b, c) = (m[0], m[1], m[2]);
    let (d, e, f) = (m[4], m[5], m[6]);
    let (g, h, i) = (m[8], m[9], m[10]);

    let det = a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g);
    if det.abs() < 1e-12 {
        return None;
    }
    let inv_det = 1.0 / det;

    let inv3 = [
        (e * i - f * h) * inv_det,
        (c * h - b * i) * inv_det,
        (b * f - c * e) * inv_det,
        (f * g - d * i) * inv_det,
        (a * i - c * g) * inv_det,
        (c * d - a * f) * inv_det,
        (d * h - e * g) * inv_det,
        (b * g - a * h) * inv_det,
        (a * e - b * d) * inv_det,
    ];

    let (tx, ty, tz) = (m[3], m[7], m[11]);
    Some([
        inv3[0],
        inv3[1],
        inv3[2],
        -(inv3[0] * tx + inv3[1] * ty + inv3[2] * tz),
        inv3[3],
        inv3[4],
        inv3[5],
        -(inv3[3] * tx + inv3[4] * ty + inv3[5] * tz),
        inv3[6],
        inv3[7],
        inv3[8],
        -(inv3[6] * tx + inv3[7] * ty + inv3[8] * tz),
    ])
}

/// Split an affine transform into translation, per-axis scale and a
/// rotation quaternion (x, y, z, w)
fn decompose(m: &Mat34) -> Transform {
    let translation = [m[3], m[7], m[11]];

    let columns = [[m[0], m[4], m[8]], [m[1], m[5], m[9]], [m[2], m[6], m[10]]];
    let mut scale = [
        length(&columns[0]),
        length(&columns[1]),
        length(&columns[2]),
    ];
    let det = m[0] * (m[5] * m[10] - m[6] * m[9]) - m[1] * (m[4] * m[10] - m[6] * m[8])
        + m[2] * (m[4] * m[9] - m[5] * m[8]);
    if det < 0.0 {
        scale[0] = -scale[0];
    }

    // Rotation matrix r[row][col], columns normalized by scale
    let mut r = [[0f32; 3]; 3];
    for col in 0..3 {
        let s = if scale[col] != 0.0 { scale[col] } else { 1.0 };
        for row in 0..3 {
            r[row][col] = columns[col][row] / s;
        }
    }

    let trace = r[0][0] + r[1][1] + r[2][2];
    let rotation = if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        [
            (r[2][1] - r[1][2]) / s,
            (r[0][2] - r[2][0]) / s,
            (r[1][0] - r[0][1]) / s,
            0.25 * s,
        ]
    } else if r[0][0] > r[1][1] && r[0][0] > r[2][2] {
        let s = (1.0 + r[0][0] - r[1][1] - r[2][2]).sqrt() * 2.0;
        [
            0.25 * s,
            (r[0][1] + r[1][0]) / s,
            (r[0][2] + r[2][0]) / s,
            (r[2][1] - r[1][2]) / s,
        ]
    } else if r[1][1] > r[2][2] {
        let s = (1.0 + r[1][1] - r[0][0] - r[2][2]).sqrt() * 2.0;
        [
            (r[0][1] + r[1][0]) / s,
            0.25 * s,
            (r[1][2] + r[2][1]) / s,
            (r[0][2] - r[2][0]) / s,
        ]
    } else {
        let s = (1.0 + r[2][2] - r[0][0] - r[1][1]).sqrt() * 2.0;
        [
            (r[0][2] + r[2][0]) / s,
            (r[1][2] + r[2][1]) / s,
            0.25 * s,
            (r[1][0] - r[0][1]) / s,
        ]
    };

    Transform {
        translation,
        scale,
        rotation,
    }
}

fn length(v: &[f32; 3]) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

// ---------------------------------------------------------------------------
// Byte plumbing

struct Reader<'a> {
    data: &'a [u8],
    at: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, at: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let slice = slice_at(self.data, self.at, n)?;
        self.at += n;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn i16(&mut self) -> Result<i16, CodecError> {
        Ok(i16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn f32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn transform(&mut self) -> Result<Transform, CodecError> {
        let mut values = [0f32; 10];
        for v in values.iter_mut() {
            *v = self.f32()?;
        }
        Ok(Transform {
            translation: [values[0], values[1], values[2]],
            scale: [values[3], values[4], values[5]],
            rotation: [values[6], values[7], values[8], values[9]],
        })
    }
}

fn slice_at(data: &[u8], at: usize, n: usize) -> Result<&[u8], CodecError> {
    data.get(at..at + n).ok_or_else(|| {
        CodecError::Truncated(format!("need {n} bytes at offset {at}, have {}", data.len()))
    })
}

fn string_at(data: &[u8], at: usize) -> Result<String, CodecError> {
    let tail = data
        .get(at..)
        .ok_or_else(|| CodecError::Truncated(format!("name offset {at} outside data")))?;
    let end = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| CodecError::Malformed(format!("unterminated name at offset {at}")))?;
    String::from_utf8(tail[..end].to_vec())
        .map_err(|_| CodecError::Malformed(format!("non-UTF-8 name at offset {at}")))
}

fn nul_terminated(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_i16(out: &mut Vec<u8>, v: i16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_f32(out: &mut Vec<u8>, v: f32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_transform(out: &mut Vec<u8>, t: &Transform) {
    for v in t.translation {
        push_f32(out, v);
    }
    for v in t.scale {
        push_f32(out, v);
    }
    for v in t.rotation {
        push_f32(out, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: Mat34 = [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0,
    ];

    fn translation(x: f32, y: f32, z: f32) -> Mat34 {
        let mut m = IDENTITY;
        m[3] = x;
        m[7] = y;
        m[11] = z;
        m
    }

    /// Legacy skeleton with the given joints as (name, parent, global matrix)
    fn legacy_skeleton(joints: &[(&str, i32, Mat34)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&LEGACY_MAGIC);
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // skeleton id
        out.extend_from_slice(&(joints.len() as u32).to_le_bytes());
        for (name, parent, matrix) in joints {
            let mut name_field = [0u8; LEGACY_NAME_SIZE];
            name_field[..name.len()].copy_from_slice(name.as_bytes());
            out.extend_from_slice(&name_field);
            out.extend_from_slice(&parent.to_le_bytes());
            out.extend_from_slice(&1.0f32.to_le_bytes()); // legacy scale
            for v in matrix {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        out
    }

    #[test]
    fn test_decode_legacy_hierarchy() {
        let data = legacy_skeleton(&[
            ("Root", -1, IDENTITY),
            ("Spine", 0, translation(1.0, 2.0, 3.0)),
        ]);
        let skeleton = SklCodec::new().decode(&data).unwrap();

        assert_eq!(skeleton.joints.len(), 2);
        assert_eq!(skeleton.joints[0].name, "Root");
        assert_eq!(skeleton.joints[0].parent, -1);
        assert_eq!(skeleton.joints[0].local, Transform::IDENTITY);

        let spine = &skeleton.joints[1];
        assert_eq!(spine.parent, 0);
        assert_eq!(spine.local.translation, [1.0, 2.0, 3.0]);
        assert_eq!(spine.local.rotation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(spine.inverse_global.translation, [-1.0, -2.0, -3.0]);

        // Revision 1 has no influence list: every joint influences
        assert_eq!(skeleton.influences, vec![0, 1]);
    }

    #[test]
    fn test_transcode_then_decode_round_trips() {
        let codec = SklCodec::new();
        let data = legacy_skeleton(&[
            ("Root", -1, IDENTITY),
            ("Spine", 0, translation(1.0, 2.0, 3.0)),
        ]);
        let expected = codec.decode(&data).unwrap();

        let current = codec.transcode(&data).unwrap();
        let reread = codec.decode(&current).unwrap();
        assert_eq!(reread.joints, expected.joints);
        assert_eq!(reread.influences, expected.influences);

        // Transcoding the current revision is stable
        assert_eq!(codec.transcode(&current).unwrap(), current);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let result = SklCodec::new().decode(b"not a skeleton at all");
        assert!(matches!(result, Err(CodecError::BadMagic)));
    }

    #[test]
    fn test_rejects_unknown_legacy_version() {
        let mut data = legacy_skeleton(&[("Root", -1, IDENTITY)]);
        data[8..12].copy_from_slice(&9u32.to_le_bytes());
        let result = SklCodec::new().decode(&data);
        assert!(matches!(result, Err(CodecError::UnsupportedVersion(9))));
    }

    #[test]
    fn test_rejects_truncated_joint_table() {
        let mut data = legacy_skeleton(&[("Root", -1, IDENTITY)]);
        data.truncate(data.len() - 10);
        assert!(matches!(
            SklCodec::new().decode(&data),
            Err(CodecError::Truncated(_))
        ));
    }

    #[test]
    fn test_rejects_forward_parent_reference() {
        let data = legacy_skeleton(&[("Root", 5, IDENTITY)]);
        assert!(matches!(
            SklCodec::new().decode(&data),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_invert_translation() {
        let inverse = invert(&translation(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(inverse[3], -1.0);
        assert_eq!(inverse[7], -2.0);
        assert_eq!(inverse[11], -3.0);
        let round = multiply(&translation(1.0, 2.0, 3.0), &inverse);
        assert_eq!(round, IDENTITY);
    }

    #[test]
    fn test_decompose_identity() {
        let t = decompose(&IDENTITY);
        assert_eq!(t, Transform::IDENTITY);
    }

    #[test]
    fn test_decompose_scale() {
        let mut m = IDENTITY;
        m[0] = 2.0;
        m[5] = 3.0;
        m[10] = 4.0;
        let t = decompose(&m);
        assert_eq!(t.scale, [2.0, 3.0, 4.0]);
        assert_eq!(t.rotation, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_elf_hash_is_case_insensitive() {
        assert_eq!(elf_hash("Root"), elf_hash("root"));
        assert_ne!(elf_hash("root"), elf_hash("spine"));
    }
}
