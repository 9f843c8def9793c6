//! Built-in word-processing document used when no template is supplied.

use crate::container::{
    app_properties_xml, content_types as ct, core_properties_xml, rel_types, ContentTypes,
    OoxmlPackage, Relationships,
};

pub(crate) const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub(crate) mod part_types {
    pub const DOCUMENT: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const STYLES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
    pub const NUMBERING: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
}

/// Numbering instance used by the "List Bullet" style.
const BULLET_NUM_ID: u32 = 1;
/// Numbering instance used by the "List Number" style.
const DECIMAL_NUM_ID: u32 = 2;

/// Letter page with one-inch margins.
const SECT_PR: &str = concat!(
    r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/>"#,
    r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>"#,
    r#"<w:cols w:space="720"/></w:sectPr>"#
);

/// Package with styles and numbering but an empty body.
pub fn default_package() -> OoxmlPackage {
    let mut pkg = OoxmlPackage::new();

    let mut types = ContentTypes::default();
    types.ensure_default("rels", ct::RELATIONSHIPS);
    types.ensure_default("xml", ct::XML);
    types.set_override("word/document.xml", part_types::DOCUMENT);
    types.set_override("word/styles.xml", part_types::STYLES);
    types.set_override("word/numbering.xml", part_types::NUMBERING);
    types.set_override("docProps/core.xml", ct::CORE_PROPERTIES);
    types.set_override("docProps/app.xml", ct::EXTENDED_PROPERTIES);
    pkg.write_content_types(&types);

    let mut root = Relationships::new();
    root.add_new(rel_types::OFFICE_DOCUMENT, "word/document.xml");
    root.add_new(rel_types::CORE_PROPERTIES, "docProps/core.xml");
    root.add_new(rel_types::EXTENDED_PROPERTIES, "docProps/app.xml");
    pkg.write_relationships("", &root);
    pkg.write_xml("docProps/core.xml", core_properties_xml("Document"));
    pkg.write_xml("docProps/app.xml", app_properties_xml());

    let mut doc_rels = Relationships::new();
    doc_rels.add_new(rel_types::STYLES, "styles.xml");
    doc_rels.add_new(rel_types::NUMBERING, "numbering.xml");
    pkg.write_relationships("word/document.xml", &doc_rels);

    pkg.write_xml(
        "word/document.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{SECT_PR}</w:body></w:document>"#
        ),
    );
    pkg.write_xml("word/styles.xml", styles_xml());
    pkg.write_xml("word/numbering.xml", numbering_xml());
    pkg
}

fn paragraph_style(id: &str, name: &str, ppr: &str, rpr: &str) -> String {
    format!(
        r#"<w:style w:type="paragraph" w:styleId="{id}"><w:name w:val="{name}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr>{ppr}</w:pPr><w:rPr>{rpr}</w:rPr></w:style>"#
    )
}

fn styles_xml() -> String {
    let mut out = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:styles xmlns:w="{ns}"><w:docDefaults><w:rPrDefault><w:rPr>"#,
            r#"<w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Microsoft JhengHei"/>"#,
            r#"<w:sz w:val="22"/><w:lang w:val="en-US" w:eastAsia="zh-TW"/></w:rPr></w:rPrDefault>"#,
            r#"<w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults>"#,
            r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#
        ),
        ns = W_NS
    );
    out.push_str(&paragraph_style(
        "Title",
        "Title",
        r#"<w:spacing w:after="300"/><w:contextualSpacing/>"#,
        r#"<w:b/><w:sz w:val="52"/>"#,
    ));
    for (level, size) in [(1u8, 32u32), (2, 26), (3, 24)] {
        out.push_str(&paragraph_style(
            &format!("Heading{level}"),
            &format!("heading {level}"),
            &format!(
                r#"<w:keepNext/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="{}"/>"#,
                level - 1
            ),
            &format!(r#"<w:b/><w:sz w:val="{size}"/>"#),
        ));
    }
    out.push_str(&paragraph_style(
        "ListBullet",
        "List Bullet",
        &format!(r#"<w:numPr><w:numId w:val="{BULLET_NUM_ID}"/></w:numPr><w:contextualSpacing/>"#),
        "",
    ));
    out.push_str(&paragraph_style(
        "ListNumber",
        "List Number",
        &format!(r#"<w:numPr><w:numId w:val="{DECIMAL_NUM_ID}"/></w:numPr><w:contextualSpacing/>"#),
        "",
    ));
    out.push_str("</w:styles>");
    out
}

fn numbering_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:numbering xmlns:w="{ns}">"#,
            r#"<w:abstractNum w:abstractNumId="0"><w:multiLevelType w:val="singleLevel"/>"#,
            r#"<w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="•"/><w:lvlJc w:val="left"/>"#,
            r#"<w:pPr><w:ind w:left="360" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum>"#,
            r#"<w:abstractNum w:abstractNumId="1"><w:multiLevelType w:val="singleLevel"/>"#,
            r#"<w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/><w:lvlJc w:val="left"/>"#,
            r#"<w:pPr><w:ind w:left="360" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum>"#,
            r#"<w:num w:numId="{bullet}"><w:abstractNumId w:val="0"/></w:num>"#,
            r#"<w:num w:numId="{decimal}"><w:abstractNumId w:val="1"/></w:num>"#,
            "</w:numbering>"
        ),
        ns = W_NS,
        bullet = BULLET_NUM_ID,
        decimal = DECIMAL_NUM_ID
    )
}
