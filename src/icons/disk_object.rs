//! Décodage du format binaire `DiskObject` des descripteurs d'icône AmigaOS.
//!
//! Le format est celui écrit par icon.library: un en-tête à offsets fixes en
//! grand-boutien, suivi de blocs optionnels (DrawerData, images des gadgets)
//! puis des chaînes préfixées par leur longueur (default tool, tool types).
//! Seuls les champs utiles au lanceur sont restitués; les blocs graphiques
//! sont sautés sans être interprétés.

const MAGIC: u16 = 0xE310;
const HEADER_LEN: usize = 78;
const DRAWER_DATA_LEN: usize = 56;
const IMAGE_HEADER_LEN: usize = 20;

// Offsets des champs exploités dans l'en-tête DiskObject.
const GADGET_RENDER_OFFSET: usize = 22;
const SELECT_RENDER_OFFSET: usize = 26;
const TYPE_OFFSET: usize = 48;
const DEFAULT_TOOL_OFFSET: usize = 50;
const TOOL_TYPES_OFFSET: usize = 54;
const DRAWER_DATA_OFFSET: usize = 66;
const STACK_SIZE_OFFSET: usize = 74;

/// Tag de type d'un descripteur.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IconType {
    Disk,
    Drawer,
    Tool,
    Project,
    Garbage,
    Device,
    Kick,
    AppIcon,
    Unknown(u8),
}

impl IconType {
    /// Construit le tag depuis l'octet brut du descripteur.
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Disk,
            2 => Self::Drawer,
            3 => Self::Tool,
            4 => Self::Project,
            5 => Self::Garbage,
            6 => Self::Device,
            7 => Self::Kick,
            8 => Self::AppIcon,
            other => Self::Unknown(other),
        }
    }
}

/// Champs d'un descripteur retenus par le lanceur.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiskObject {
    /// Tag de type (projet, outil, tiroir...).
    pub icon_type: IconType,
    /// Chemin du handler par défaut, si le descripteur en désigne un.
    pub default_tool: Option<String>,
    /// Table des tool types, la configuration locale du handler.
    pub tool_types: Vec<String>,
    /// Hint de taille de pile; 0 signifie la valeur système.
    pub stack_size: u32,
}

/// Curseur de lecture séquentielle sur le contenu du fichier.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], &'static str> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or("truncated descriptor")?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), &'static str> {
        self.take(len).map(|_| ())
    }

    fn u32(&mut self) -> Result<u32, &'static str> {
        let raw = self.take(4)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    /// Lit une chaîne préfixée par sa longueur (NUL final inclus).
    ///
    /// Les octets sont du Latin-1, convertis caractère par caractère.
    fn string(&mut self) -> Result<String, &'static str> {
        let len = self.u32()? as usize;
        if len == 0 {
            return Ok(String::new());
        }
        let raw = self.take(len)?;
        let data = raw.strip_suffix(&[0]).unwrap_or(raw);
        Ok(data.iter().map(|&b| b as char).collect())
    }
}

fn be_u16(header: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([header[offset], header[offset + 1]])
}

fn be_u32(header: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        header[offset],
        header[offset + 1],
        header[offset + 2],
        header[offset + 3],
    ])
}

/// Décode un descripteur depuis le contenu brut d'un fichier `.info`.
///
/// Les pointeurs de l'en-tête ne sont pas des adresses exploitables: seule
/// leur nullité indique la présence du bloc correspondant dans le fichier.
pub fn parse(bytes: &[u8]) -> Result<DiskObject, &'static str> {
    if bytes.len() < HEADER_LEN {
        return Err("truncated descriptor");
    }
    let header = &bytes[..HEADER_LEN];
    if be_u16(header, 0) != MAGIC {
        return Err("bad magic");
    }

    let gadget_render = be_u32(header, GADGET_RENDER_OFFSET);
    let select_render = be_u32(header, SELECT_RENDER_OFFSET);
    let icon_type = IconType::from_raw(header[TYPE_OFFSET]);
    let default_tool_present = be_u32(header, DEFAULT_TOOL_OFFSET) != 0;
    let tool_types_present = be_u32(header, TOOL_TYPES_OFFSET) != 0;
    let drawer_data_present = be_u32(header, DRAWER_DATA_OFFSET) != 0;
    let stack_size = be_u32(header, STACK_SIZE_OFFSET);

    let mut reader = Reader {
        bytes,
        pos: HEADER_LEN,
    };
    if drawer_data_present {
        reader.skip(DRAWER_DATA_LEN)?;
    }
    if gadget_render != 0 {
        skip_image(&mut reader)?;
    }
    if select_render != 0 {
        skip_image(&mut reader)?;
    }

    let default_tool = if default_tool_present {
        Some(reader.string()?)
    } else {
        None
    };

    let mut tool_types = Vec::new();
    if tool_types_present {
        // La table encode (nombre d'entrées + 1) * 4 dans son premier mot.
        let table_len = reader.u32()? as usize;
        let count = (table_len / 4).saturating_sub(1);
        for _ in 0..count {
            tool_types.push(reader.string()?);
        }
    }

    Ok(DiskObject {
        icon_type,
        default_tool,
        tool_types,
        stack_size,
    })
}

/// Saute un en-tête d'image de gadget et son bitmap.
fn skip_image(reader: &mut Reader<'_>) -> Result<(), &'static str> {
    let header = reader.take(IMAGE_HEADER_LEN)?;
    let width = be_u16(header, 4) as usize;
    let height = be_u16(header, 6) as usize;
    let depth = be_u16(header, 8) as usize;
    let image_data = be_u32(header, 10);
    if image_data != 0 {
        let row_bytes = (width + 15) / 16 * 2;
        reader.skip(row_bytes * height * depth)?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::encode::{icon_bytes, IconSpec};
    use super::*;

    #[test]
    fn parses_project_icon_fields() {
        let bytes = icon_bytes(&IconSpec {
            icon_type: 4,
            default_tool: Some("Work:WHDLoad/WHDLoad"),
            tool_types: &["Slave=Game.slave", "PRELOAD"],
            stack_size: 8000,
            ..IconSpec::default()
        });
        let icon = parse(&bytes).unwrap();
        assert_eq!(icon.icon_type, IconType::Project);
        assert_eq!(icon.default_tool.as_deref(), Some("Work:WHDLoad/WHDLoad"));
        assert_eq!(icon.tool_types, vec!["Slave=Game.slave", "PRELOAD"]);
        assert_eq!(icon.stack_size, 8000);
    }

    #[test]
    fn skips_drawer_data_and_images_before_strings() {
        let bytes = icon_bytes(&IconSpec {
            icon_type: 4,
            default_tool: Some("C:WHDLoad"),
            stack_size: 4096,
            with_drawer_data: true,
            with_image: true,
            ..IconSpec::default()
        });
        let icon = parse(&bytes).unwrap();
        assert_eq!(icon.default_tool.as_deref(), Some("C:WHDLoad"));
        assert_eq!(icon.stack_size, 4096);
    }

    #[test]
    fn tool_icon_has_no_default_tool_requirement() {
        let bytes = icon_bytes(&IconSpec {
            icon_type: 3,
            ..IconSpec::default()
        });
        let icon = parse(&bytes).unwrap();
        assert_eq!(icon.icon_type, IconType::Tool);
        assert!(icon.default_tool.is_none());
        assert!(icon.tool_types.is_empty());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = icon_bytes(&IconSpec::default());
        bytes[0] = 0;
        assert_eq!(parse(&bytes), Err("bad magic"));
    }

    #[test]
    fn rejects_truncated_descriptor() {
        let bytes = icon_bytes(&IconSpec {
            default_tool: Some("Work:WHDLoad/WHDLoad"),
            ..IconSpec::default()
        });
        assert_eq!(parse(&bytes[..bytes.len() - 3]), Err("truncated descriptor"));
        assert_eq!(parse(&bytes[..20]), Err("truncated descriptor"));
    }

    #[test]
    fn rejects_lying_string_length() {
        let mut bytes = icon_bytes(&IconSpec {
            default_tool: Some("x"),
            ..IconSpec::default()
        });
        // Gonfle la longueur annoncée du default tool au-delà du fichier.
        let len_offset = bytes.len() - 6;
        bytes[len_offset..len_offset + 4].copy_from_slice(&0xFFFF_FFFFu32.to_be_bytes());
        assert_eq!(parse(&bytes), Err("truncated descriptor"));
    }
}
