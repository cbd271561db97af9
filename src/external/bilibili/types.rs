use serde::Deserialize;

/// Common `{code, message, data}` envelope of the web API
#[derive(Debug, Deserialize)]
pub(super) struct BiliEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ArcSearchData {
    pub list: Option<ArcList>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ArcList {
    pub vlist: Option<Vec<ArcItem>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ArcItem {
    pub bvid: String,
    pub title: String,
    pub author: String,
    pub created: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct NavData {
    pub wbi_img: WbiImg,
}

#[derive(Debug, Deserialize)]
pub(super) struct WbiImg {
    pub img_url: String,
    pub sub_url: String,
}
