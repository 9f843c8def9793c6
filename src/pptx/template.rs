//! Built-in presentation used when no usable template is supplied.
//!
//! The package is assembled from a small layout table so tests can produce
//! templates with unusual layout sets (for example a "Title and Content"
//! layout without a body placeholder).

use crate::container::{
    app_properties_xml, content_types as ct, core_properties_xml, rel_types, ContentTypes,
    OoxmlPackage, Relationships,
};
use crate::pptx::shape::Rect;
use crate::xml;
use std::fmt::Write as FmtWrite;

pub(crate) const NS_DECL: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

pub(crate) const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub(crate) const GROUP_HEADER: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

pub(crate) mod part_types {
    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const PRES_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
    pub const VIEW_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
    pub const TABLE_STYLES: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
}

const REL_PRES_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
const REL_VIEW_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
const REL_TABLE_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";

/// Default slide size: 10 x 7.5 inches.
pub const DEFAULT_SLIDE_WIDTH: i64 = 9_144_000;
pub const DEFAULT_SLIDE_HEIGHT: i64 = 6_858_000;

/// A placeholder on a generated layout.
#[derive(Debug, Clone)]
pub(crate) struct PlaceholderSpec {
    pub name: &'static str,
    pub kind: Option<&'static str>,
    pub idx: Option<u32>,
    pub rect: Rect,
}

/// A generated layout.
#[derive(Debug, Clone)]
pub(crate) struct LayoutSpec {
    pub name: &'static str,
    /// `sldLayout/@type`
    pub layout_type: &'static str,
    pub placeholders: Vec<PlaceholderSpec>,
}

pub(crate) const TITLE_RECT: Rect = Rect::new(457_200, 274_638, 8_229_600, 1_143_000);
pub(crate) const BODY_RECT: Rect = Rect::new(457_200, 1_600_200, 8_229_600, 4_525_963);
const CTR_TITLE_RECT: Rect = Rect::new(685_800, 2_130_425, 7_772_400, 1_470_025);
const SUBTITLE_RECT: Rect = Rect::new(1_371_600, 3_886_200, 6_400_800, 1_752_600);

pub(crate) fn title_placeholder() -> PlaceholderSpec {
    PlaceholderSpec {
        name: "Title 1",
        kind: Some("title"),
        idx: None,
        rect: TITLE_RECT,
    }
}

pub(crate) fn body_placeholder() -> PlaceholderSpec {
    PlaceholderSpec {
        name: "Content Placeholder 2",
        kind: None,
        idx: Some(1),
        rect: BODY_RECT,
    }
}

/// Layouts of the built-in presentation.
pub(crate) fn default_layouts() -> Vec<LayoutSpec> {
    vec![
        LayoutSpec {
            name: "Title Slide",
            layout_type: "title",
            placeholders: vec![
                PlaceholderSpec {
                    name: "Title 1",
                    kind: Some("ctrTitle"),
                    idx: None,
                    rect: CTR_TITLE_RECT,
                },
                PlaceholderSpec {
                    name: "Subtitle 2",
                    kind: Some("subTitle"),
                    idx: Some(1),
                    rect: SUBTITLE_RECT,
                },
            ],
        },
        LayoutSpec {
            name: "Title and Content",
            layout_type: "obj",
            placeholders: vec![title_placeholder(), body_placeholder()],
        },
        LayoutSpec {
            name: "Title Only",
            layout_type: "titleOnly",
            placeholders: vec![title_placeholder()],
        },
        LayoutSpec {
            name: "Blank",
            layout_type: "blank",
            placeholders: Vec::new(),
        },
    ]
}

/// The built-in presentation package.
pub fn default_package() -> OoxmlPackage {
    build_package(&default_layouts())
}

/// Assemble a presentation package with the given layouts and no slides.
pub(crate) fn build_package(layouts: &[LayoutSpec]) -> OoxmlPackage {
    let mut pkg = OoxmlPackage::new();

    let mut types = ContentTypes::default();
    types.ensure_default("rels", ct::RELATIONSHIPS);
    types.ensure_default("xml", ct::XML);
    types.set_override("ppt/presentation.xml", part_types::PRESENTATION);
    types.set_override("ppt/slideMasters/slideMaster1.xml", part_types::SLIDE_MASTER);
    for i in 1..=layouts.len() {
        types.set_override(
            &format!("ppt/slideLayouts/slideLayout{i}.xml"),
            part_types::SLIDE_LAYOUT,
        );
    }
    types.set_override("ppt/theme/theme1.xml", ct::THEME);
    types.set_override("ppt/presProps.xml", part_types::PRES_PROPS);
    types.set_override("ppt/viewProps.xml", part_types::VIEW_PROPS);
    types.set_override("ppt/tableStyles.xml", part_types::TABLE_STYLES);
    types.set_override("docProps/core.xml", ct::CORE_PROPERTIES);
    types.set_override("docProps/app.xml", ct::EXTENDED_PROPERTIES);
    pkg.write_content_types(&types);

    let mut root = Relationships::new();
    root.add_new(rel_types::OFFICE_DOCUMENT, "ppt/presentation.xml");
    root.add_new(rel_types::CORE_PROPERTIES, "docProps/core.xml");
    root.add_new(rel_types::EXTENDED_PROPERTIES, "docProps/app.xml");
    pkg.write_relationships("", &root);
    pkg.write_xml("docProps/core.xml", core_properties_xml("Presentation"));
    pkg.write_xml("docProps/app.xml", app_properties_xml());

    let mut pres_rels = Relationships::new();
    let master_rid = pres_rels.add_new(rel_types::SLIDE_MASTER, "slideMasters/slideMaster1.xml");
    pres_rels.add_new(rel_types::THEME, "theme/theme1.xml");
    pres_rels.add_new(REL_PRES_PROPS, "presProps.xml");
    pres_rels.add_new(REL_VIEW_PROPS, "viewProps.xml");
    pres_rels.add_new(REL_TABLE_STYLES, "tableStyles.xml");
    pkg.write_relationships("ppt/presentation.xml", &pres_rels);
    pkg.write_xml("ppt/presentation.xml", presentation_xml(&master_rid));

    let mut master_rels = Relationships::new();
    let mut layout_rids = Vec::with_capacity(layouts.len());
    for (i, layout) in layouts.iter().enumerate() {
        let n = i + 1;
        let path = format!("ppt/slideLayouts/slideLayout{n}.xml");
        layout_rids.push(master_rels.add_new(rel_types::SLIDE_LAYOUT, &format!("../slideLayouts/slideLayout{n}.xml")));

        let mut rels = Relationships::new();
        rels.add_new(rel_types::SLIDE_MASTER, "../slideMasters/slideMaster1.xml");
        pkg.write_relationships(&path, &rels);
        pkg.write_xml(&path, layout_xml(layout));
    }
    master_rels.add_new(rel_types::THEME, "../theme/theme1.xml");
    pkg.write_relationships("ppt/slideMasters/slideMaster1.xml", &master_rels);
    pkg.write_xml("ppt/slideMasters/slideMaster1.xml", master_xml(&layout_rids));

    pkg.write_xml("ppt/theme/theme1.xml", THEME_XML);
    pkg.write_xml(
        "ppt/presProps.xml",
        format!("{XML_DECL}\n<p:presentationPr {NS_DECL}/>"),
    );
    pkg.write_xml(
        "ppt/viewProps.xml",
        format!(
            "{XML_DECL}\n<p:viewPr {NS_DECL}><p:normalViewPr><p:restoredLeft sz=\"15620\"/><p:restoredTop sz=\"94660\"/></p:normalViewPr><p:gridSpacing cx=\"76200\" cy=\"76200\"/></p:viewPr>"
        ),
    );
    pkg.write_xml(
        "ppt/tableStyles.xml",
        format!(
            "{XML_DECL}\n<a:tblStyleLst xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" def=\"{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}\"/>"
        ),
    );

    pkg
}

fn presentation_xml(master_rid: &str) -> String {
    format!(
        concat!(
            "{decl}\n<p:presentation {ns} saveSubsetFonts=\"1\">",
            "<p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"{rid}\"/></p:sldMasterIdLst>",
            "<p:sldSz cx=\"{w}\" cy=\"{h}\" type=\"screen4x3\"/>",
            "<p:notesSz cx=\"6858000\" cy=\"9144000\"/>",
            "</p:presentation>"
        ),
        decl = XML_DECL,
        ns = NS_DECL,
        rid = master_rid,
        w = DEFAULT_SLIDE_WIDTH,
        h = DEFAULT_SLIDE_HEIGHT
    )
}

fn placeholder_sp(out: &mut String, id: u32, spec: &PlaceholderSpec) {
    let _ = write!(
        out,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>"#,
        id,
        xml::escape(spec.name)
    );
    out.push_str("<p:ph");
    if let Some(kind) = spec.kind {
        let _ = write!(out, r#" type="{kind}""#);
    }
    if let Some(idx) = spec.idx {
        let _ = write!(out, r#" idx="{idx}""#);
    }
    let r = spec.rect;
    let _ = write!(
        out,
        concat!(
            r#"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm></p:spPr>"#,
            r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#
        ),
        r.left, r.top, r.width, r.height
    );
}

fn layout_xml(layout: &LayoutSpec) -> String {
    let mut out = String::with_capacity(1024);
    let _ = write!(
        out,
        r#"{}
<p:sldLayout {} type="{}" preserve="1"><p:cSld name="{}"><p:spTree>{}"#,
        XML_DECL,
        NS_DECL,
        layout.layout_type,
        xml::escape(layout.name),
        GROUP_HEADER
    );
    for (i, ph) in layout.placeholders.iter().enumerate() {
        placeholder_sp(&mut out, i as u32 + 2, ph);
    }
    out.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>");
    out
}

fn master_xml(layout_rids: &[String]) -> String {
    let mut out = String::with_capacity(4096);
    let _ = write!(
        out,
        r#"{}
<p:sldMaster {}><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{}"#,
        XML_DECL, NS_DECL, GROUP_HEADER
    );
    placeholder_sp(&mut out, 2, &title_placeholder());
    placeholder_sp(
        &mut out,
        3,
        &PlaceholderSpec {
            name: "Text Placeholder 2",
            kind: Some("body"),
            idx: Some(1),
            rect: BODY_RECT,
        },
    );
    out.push_str(concat!(
        "</p:spTree></p:cSld>",
        r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
        r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
        "<p:sldLayoutIdLst>"
    ));
    for (i, rid) in layout_rids.iter().enumerate() {
        let _ = write!(
            out,
            r#"<p:sldLayoutId id="{}" r:id="{}"/>"#,
            2_147_483_649u64 + i as u64,
            rid
        );
    }
    out.push_str("</p:sldLayoutIdLst>");
    out.push_str(MASTER_TEXT_STYLES);
    out.push_str("</p:sldMaster>");
    out
}

const MASTER_TEXT_STYLES: &str = concat!(
    "<p:txStyles>",
    r#"<p:titleStyle><a:lvl1pPr algn="ctr" defTabSz="914400" rtl="0" eaLnBrk="1" latinLnBrk="0" hangingPunct="1">"#,
    r#"<a:spcBef><a:spcPct val="0"/></a:spcBef><a:buNone/><a:defRPr sz="4400" kern="1200">"#,
    r#"<a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/><a:ea typeface="+mj-ea"/><a:cs typeface="+mj-cs"/>"#,
    "</a:defRPr></a:lvl1pPr></p:titleStyle>",
    r#"<p:bodyStyle><a:lvl1pPr marL="342900" indent="-342900" algn="l" defTabSz="914400" rtl="0" eaLnBrk="1" latinLnBrk="0" hangingPunct="1">"#,
    r#"<a:spcBef><a:spcPct val="20000"/></a:spcBef><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/><a:defRPr sz="2800" kern="1200">"#,
    r#"<a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/>"#,
    "</a:defRPr></a:lvl1pPr></p:bodyStyle>",
    r#"<p:otherStyle><a:defPPr><a:defRPr lang="en-US"/></a:defPPr></p:otherStyle>"#,
    "</p:txStyles>"
);

const THEME_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements>"#,
    r#"<a:clrScheme name="Office">"#,
    r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
    r#"<a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2>"#,
    r#"<a:accent1><a:srgbClr val="4F81BD"/></a:accent1><a:accent2><a:srgbClr val="C0504D"/></a:accent2>"#,
    r#"<a:accent3><a:srgbClr val="9BBB59"/></a:accent3><a:accent4><a:srgbClr val="8064A2"/></a:accent4>"#,
    r#"<a:accent5><a:srgbClr val="4BACC6"/></a:accent5><a:accent6><a:srgbClr val="F79646"/></a:accent6>"#,
    r#"<a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink>"#,
    "</a:clrScheme>",
    r#"<a:fontScheme name="Office">"#,
    r#"<a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
    r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
    "</a:fontScheme>",
    r#"<a:fmtScheme name="Office"><a:fillStyleLst>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    "</a:fillStyleLst><a:lnStyleLst>",
    r#"<a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="25400"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="38100"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    "</a:lnStyleLst><a:effectStyleLst>",
    "<a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle>",
    "</a:effectStyleLst><a:bgFillStyleLst>",
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    "</a:bgFillStyleLst></a:fmtScheme>",
    "</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::shape::scan_shapes;

    #[test]
    fn test_default_package_parts() {
        let pkg = default_package();
        assert_eq!(pkg.main_part().unwrap(), "ppt/presentation.xml");
        assert!(pkg.exists("ppt/slideLayouts/slideLayout4.xml"));
        assert!(pkg.exists("ppt/theme/theme1.xml"));
        let types = pkg.content_types().unwrap();
        assert_eq!(
            types.content_type_of("ppt/slideMasters/slideMaster1.xml"),
            Some(part_types::SLIDE_MASTER)
        );
    }

    #[test]
    fn test_layout_placeholders() {
        let pkg = default_package();
        let xml = pkg.read_xml("ppt/slideLayouts/slideLayout2.xml").unwrap();
        assert!(xml.contains(r#"<p:cSld name="Title and Content">"#));
        let shapes = scan_shapes(&xml).unwrap();
        assert_eq!(shapes.len(), 2);
        assert!(shapes[0].placeholder.as_ref().unwrap().is_title());
        assert!(shapes[1].placeholder.as_ref().unwrap().is_body());
    }

    #[test]
    fn test_master_lists_every_layout() {
        let pkg = default_package();
        let master = pkg.read_xml("ppt/slideMasters/slideMaster1.xml").unwrap();
        assert_eq!(master.matches("<p:sldLayoutId ").count(), 4);
        let rels = pkg
            .read_relationships("ppt/slideMasters/slideMaster1.xml")
            .unwrap();
        assert_eq!(rels.get_by_type(rel_types::SLIDE_LAYOUT).len(), 4);
    }

    #[test]
    fn test_package_serializes() {
        let bytes = default_package().to_bytes().unwrap();
        assert_eq!(
            crate::detect::detect_format_from_bytes(&bytes).unwrap(),
            crate::detect::FormatType::Pptx
        );
    }
}
