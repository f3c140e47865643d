//! Very simple functions for producing KML files of fire changes.
//!
//! This is not a general solution at all. It only implements the handful of elements needed to put
//! change events on a map, with a streaming API. That means the user is responsible for closing
//! all tags.

use crate::FireChangeResult;
use chrono::NaiveDate;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

/// A plain text KML file.
pub struct KmlFile(BufWriter<File>);

impl KmlFile {
    pub fn new<P: AsRef<Path>>(pth: P) -> FireChangeResult<Self> {
        let p = pth.as_ref();

        let f = File::create(p)?;
        let mut new = KmlFile(BufWriter::new(f));
        new.start_document()?;
        Ok(new)
    }
}

impl KmlWriter for KmlFile {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.0
    }
}

impl Drop for KmlFile {
    fn drop(&mut self) {
        self.finish_document();
    }
}

/// A zipped KML file with a single "doc.kml" entry.
pub struct KmzFile(ZipWriter<File>);

impl KmzFile {
    pub fn new<P: AsRef<Path>>(pth: P) -> FireChangeResult<Self> {
        let p = pth.as_ref();

        let f = File::create(p)?;
        let mut zip = ZipWriter::new(f);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file("doc.kml", options)?;

        let mut new = KmzFile(zip);
        new.start_document()?;
        Ok(new)
    }
}

impl KmlWriter for KmzFile {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.0
    }
}

impl Drop for KmzFile {
    fn drop(&mut self) {
        self.finish_document();
        if let Err(err) = self.0.finish() {
            log::error!("Error closing KMZ archive: {}", err);
        }
    }
}

pub trait KmlWriter {
    fn output(&mut self) -> &mut dyn Write;

    /// Put the header out.
    fn start_document(&mut self) -> FireChangeResult<()> {
        const HEADER: &str = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#,
            "\n",
            "<Document>\n"
        );

        self.output().write_all(HEADER.as_bytes())?;

        Ok(())
    }

    /// Close a document.
    fn finish_document(&mut self) {
        const FOOTER: &str = concat!(r#"</Document>"#, "\n", r#"</kml>"#, "\n");
        let _ = self.output().write_all(FOOTER.as_bytes());
    }

    /// Write a description element to the file.
    ///
    /// The description goes in a CDATA section, so any `]]>` in it is split across two sections.
    fn write_description(&mut self, description: &str) -> FireChangeResult<()> {
        writeln!(
            self.output(),
            "<description><![CDATA[{}]]></description>",
            description.replace("]]>", "]]]]><![CDATA[>")
        )?;
        Ok(())
    }

    /// Start a KML folder.
    fn start_folder(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        is_open: bool,
    ) -> FireChangeResult<()> {
        self.output().write_all("<Folder>\n".as_bytes())?;

        if let Some(name) = name {
            writeln!(self.output(), "<name>{}</name>", name)?;
        }

        if let Some(description) = description {
            self.write_description(description)?;
        }

        if is_open {
            self.output().write_all("<open>1</open>\n".as_bytes())?;
        }

        Ok(())
    }

    /// Close out a folder element
    fn finish_folder(&mut self) -> FireChangeResult<()> {
        writeln!(self.output(), "</Folder>")?;
        Ok(())
    }

    /// Start a placemark element.
    fn start_placemark(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        style_url: Option<&str>,
    ) -> FireChangeResult<()> {
        writeln!(self.output(), "<Placemark>")?;

        if let Some(name) = name {
            writeln!(self.output(), "<name>{}</name>", name)?;
        }

        if let Some(description) = description {
            self.write_description(description)?;
        }

        if let Some(style_url) = style_url {
            writeln!(self.output(), "<styleUrl>{}</styleUrl>", style_url)?;
        }

        Ok(())
    }

    /// Close out a placemark element.
    fn finish_placemark(&mut self) -> FireChangeResult<()> {
        writeln!(self.output(), "</Placemark>")?;
        Ok(())
    }

    /// Start a style definition.
    fn start_style(&mut self, style_id: Option<&str>) -> FireChangeResult<()> {
        if let Some(style_id) = style_id {
            writeln!(self.output(), "<Style id=\"{}\">", style_id)?;
        } else {
            writeln!(self.output(), "<Style>")?;
        }
        Ok(())
    }

    /// Close out a style definition.
    fn finish_style(&mut self) -> FireChangeResult<()> {
        writeln!(self.output(), "</Style>")?;
        Ok(())
    }

    /// Create an IconStyle element.
    ///
    /// The color is in the KML aabbggrr hex format.
    fn create_icon_style(
        &mut self,
        icon_url: Option<&str>,
        color: Option<&str>,
        scale: f64,
    ) -> FireChangeResult<()> {
        writeln!(self.output(), "<IconStyle>")?;

        if let Some(color) = color {
            writeln!(self.output(), "<color>{}</color>", color)?;
        }

        if scale > 0.0 {
            writeln!(self.output(), "<scale>{}</scale>", scale)?;
        } else {
            writeln!(self.output(), "<scale>1</scale>")?;
        }

        if let Some(icon_url) = icon_url {
            writeln!(self.output(), "<Icon><href>{}</href></Icon>", icon_url)?;
        }

        writeln!(self.output(), "</IconStyle>")?;
        Ok(())
    }

    /// Write out a TimeSpan element, either end may be left open.
    fn timespan(
        &mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> FireChangeResult<()> {
        if start.is_none() && end.is_none() {
            return Ok(());
        }

        self.output().write_all("<TimeSpan>\n".as_bytes())?;
        if let Some(start) = start {
            writeln!(self.output(), "<begin>{}</begin>", start.format("%Y-%m-%d"))?;
        }
        if let Some(end) = end {
            writeln!(self.output(), "<end>{}</end>", end.format("%Y-%m-%d"))?;
        }
        self.output().write_all("</TimeSpan>\n".as_bytes())?;
        Ok(())
    }

    /// Write out a KML Point element
    fn create_point(&mut self, lat: f64, lon: f64, z: f64) -> FireChangeResult<()> {
        writeln!(
            self.output(),
            "<Point>\n<coordinates>{},{},{}</coordinates>\n</Point>",
            lon,
            lat,
            z
        )?;
        Ok(())
    }
}
