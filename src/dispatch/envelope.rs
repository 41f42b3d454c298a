// ==========================================
// 待打包订单发运系统 - SOAP 报文
// ==========================================
// 渲染: tera 模板（.xml 后缀开启自动转义，转义函数替换为 XML 版本）
// 解析: 仅识别 SOAP 1.1 Fault（faultcode / faultstring）
// ==========================================

use crate::dispatch::error::CarrierError;
use crate::dispatch::payload::EmbarqueRequest;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "crear_embarque.xml";

const TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:tns="{{ namespace }}">
  <soap:Body>
    <tns:CrearEmbarque>
      <tns:siglasCliente>{{ request.siglasCliente }}</tns:siglasCliente>
      <tns:embarques>
        <tns:embarque>
          {%- set e = request.embarques.embarque %}
          <tns:cantidad>{{ e.cantidad }}</tns:cantidad>
          <tns:codigoPostal>{{ e.codigoPostal }}</tns:codigoPostal>
          <tns:colonia>{{ e.colonia }}</tns:colonia>
          <tns:contacto>{{ e.contacto }}</tns:contacto>
          <tns:direccion>{{ e.direccion }}</tns:direccion>
          <tns:montoAsegurado>{{ e.montoAsegurado }}</tns:montoAsegurado>
          <tns:poblacion>{{ e.poblacion }}</tns:poblacion>
          <tns:razonSocial>{{ e.razonSocial }}</tns:razonSocial>
          <tns:referencia2>{{ e.referencia2 }}</tns:referencia2>
          <tns:referencia3>{{ e.referencia3 }}</tns:referencia3>
          <tns:referencia4>{{ e.referencia4 }}</tns:referencia4>
          <tns:referencia5>{{ e.referencia5 }}</tns:referencia5>
          <tns:referencia6>{{ e.referencia6 }}</tns:referencia6>
          <tns:referencia7>{{ e.referencia7 }}</tns:referencia7>
          <tns:servicio>{{ e.servicio }}</tns:servicio>
          <tns:telefono>{{ e.telefono }}</tns:telefono>
          <tns:uccList>
            {%- for ucc in e.uccList %}
            <tns:string>{{ ucc }}</tns:string>
            {%- endfor %}
          </tns:uccList>
        </tns:embarque>
      </tns:embarques>
    </tns:CrearEmbarque>
  </soap:Body>
</soap:Envelope>
"#;

/// SOAP 报文渲染器
pub struct SoapEnvelope {
    tera: Tera,
}

impl SoapEnvelope {
    pub fn new() -> Result<Self, CarrierError> {
        let mut tera = Tera::default();
        tera.set_escape_fn(escape_xml);
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
        Ok(Self { tera })
    }

    /// 渲染 CrearEmbarque 请求
    pub fn render(&self, namespace: &str, request: &EmbarqueRequest) -> Result<String, CarrierError> {
        let mut context = Context::new();
        context.insert("namespace", namespace);
        context.insert("request", request);
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}

/// 从响应中提取 SOAP Fault
///
/// # 返回
/// - Some((faultcode, faultstring)): 响应是 Fault
/// - None: 非 Fault 响应
pub fn parse_fault(body: &str) -> Option<(String, String)> {
    element_text(body, "Fault")?;
    let code = element_text(body, "faultcode").unwrap_or_default();
    let message = element_text(body, "faultstring").unwrap_or_default();
    Some((code.trim().to_string(), decode_entities(message.trim())))
}

// 按本地名查找第一个开始标签（忽略命名空间前缀与属性），返回其文本内容
fn element_text<'a>(body: &'a str, local_name: &str) -> Option<&'a str> {
    let mut search_from = 0;
    while let Some(offset) = body[search_from..].find(local_name) {
        let name_start = search_from + offset;
        let name_end = name_start + local_name.len();
        search_from = name_end;

        let tag_start = match body[..name_start].rfind('<') {
            Some(pos) => pos,
            None => continue,
        };
        let prefix = &body[tag_start + 1..name_start];
        let is_open_tag = prefix.is_empty()
            || (prefix.ends_with(':') && prefix.chars().all(|c| c.is_alphanumeric() || c == ':' || c == '_'));
        let boundary_ok = matches!(
            body[name_end..].chars().next(),
            Some('>') | Some(' ') | Some('/') | Some('\t') | Some('\r') | Some('\n')
        );
        if !is_open_tag || !boundary_ok {
            continue;
        }

        let content_start = name_end + body[name_end..].find('>')? + 1;
        let content_end = content_start + body[content_start..].find("</").unwrap_or(0);
        return Some(&body[content_start..content_end]);
    }
    None
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
