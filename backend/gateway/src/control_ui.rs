//! Browser upload form served at `GET /api/upload/`.

use axum::response::Html;

const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>docforge: document extraction</title>
  <style>
    body { font-family: sans-serif; max-width: 42rem; margin: 2rem auto; }
    textarea { width: 100%; }
    pre { background: #f4f4f4; padding: 1rem; white-space: pre-wrap; }
  </style>
</head>
<body>
  <h1>Upload a document</h1>
  <form id="upload" action="/api/process/" method="post" enctype="multipart/form-data">
    <p><input type="file" name="document" accept="image/*" required></p>
    <p><textarea name="prompt" rows="4"
      placeholder="e.g. Get the invoice total, currency and invoice number"></textarea></p>
    <p><button type="submit">Process</button></p>
  </form>
  <pre id="result"></pre>
  <script>
    document.getElementById("upload").addEventListener("submit", async (ev) => {
      ev.preventDefault();
      const out = document.getElementById("result");
      out.textContent = "Processing...";
      const res = await fetch(ev.target.action, { method: "POST", body: new FormData(ev.target) });
      out.textContent = JSON.stringify(await res.json(), null, 2);
    });
  </script>
</body>
</html>
"#;

pub async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}
